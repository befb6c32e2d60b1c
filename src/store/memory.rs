use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::BetStore;
use crate::error::StoreError;
use crate::models::{Bet, BetStatus};

/// Serializable copy of the whole ledger
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub balances: BTreeMap<String, Decimal>,
    pub bets: Vec<Bet>,
}

/// Concurrent in-memory ledger.
///
/// Balance updates run while holding the account's map entry, which gives
/// the per-user serialization the debit needs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    balances: DashMap<String, Decimal>,
    bets: DashMap<Uuid, Bet>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        let store = Self::new();
        for (user_id, balance) in snapshot.balances {
            store.balances.insert(user_id, balance);
        }
        for bet in snapshot.bets {
            store.bets.insert(bet.id, bet);
        }
        store
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            balances: self
                .balances
                .iter()
                .map(|entry| (entry.key().clone(), *entry.value()))
                .collect(),
            bets: self.collect_bets(|_| true),
        }
    }

    fn collect_bets(&self, keep: impl Fn(&Bet) -> bool) -> Vec<Bet> {
        let mut bets: Vec<Bet> = self
            .bets
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        bets.sort_by(|a, b| a.placed_at.cmp(&b.placed_at).then(a.id.cmp(&b.id)));
        bets
    }
}

impl BetStore for MemoryStore {
    fn open_account(&self, user_id: &str, starting: Decimal) -> Decimal {
        *self
            .balances
            .entry(user_id.to_string())
            .or_insert(starting)
            .value()
    }

    fn balance(&self, user_id: &str) -> Option<Decimal> {
        self.balances.get(user_id).map(|balance| *balance)
    }

    fn debit_if_sufficient(&self, user_id: &str, amount: Decimal) -> Result<Decimal, StoreError> {
        match self.balances.entry(user_id.to_string()) {
            Entry::Occupied(mut entry) => {
                let available = *entry.get();
                if available < amount {
                    return Err(StoreError::Insufficient {
                        user_id: user_id.to_string(),
                        required: amount,
                        available,
                    });
                }
                let remaining = available - amount;
                entry.insert(remaining);
                Ok(remaining)
            }
            Entry::Vacant(_) => Err(StoreError::Insufficient {
                user_id: user_id.to_string(),
                required: amount,
                available: Decimal::ZERO,
            }),
        }
    }

    fn credit(&self, user_id: &str, amount: Decimal) -> Result<Decimal, StoreError> {
        let mut balance = self
            .balances
            .entry(user_id.to_string())
            .or_insert(Decimal::ZERO);
        *balance += amount;
        Ok(*balance)
    }

    fn insert_bets(&self, bets: &[Bet]) -> Result<(), StoreError> {
        if let Some(existing) = bets.iter().find(|bet| self.bets.contains_key(&bet.id)) {
            return Err(StoreError::DuplicateBet(existing.id));
        }
        for bet in bets {
            self.bets.insert(bet.id, bet.clone());
        }
        Ok(())
    }

    fn bets_for_user(&self, user_id: &str) -> Vec<Bet> {
        self.collect_bets(|bet| bet.user_id == user_id)
    }

    fn pending_bets_for_matchup(&self, matchup_id: &str) -> Vec<Bet> {
        self.collect_bets(|bet| bet.matchup_id == matchup_id && bet.status == BetStatus::Pending)
    }

    fn all_bets(&self) -> Vec<Bet> {
        self.collect_bets(|_| true)
    }

    fn settle_bet(
        &self,
        bet_id: Uuid,
        status: BetStatus,
        payout: Decimal,
        settled_at: DateTime<Utc>,
    ) -> Result<Option<Bet>, StoreError> {
        let mut bet = self
            .bets
            .get_mut(&bet_id)
            .ok_or(StoreError::UnknownBet(bet_id))?;
        if bet.status.is_settled() {
            return Ok(None);
        }
        bet.status = status;
        bet.actual_payout = Some(payout);
        bet.settled_at = Some(settled_at);
        let settled = bet.clone();
        // Credit while still holding the bet so a concurrent settle sees it settled
        if payout > Decimal::ZERO {
            self.credit(&settled.user_id, payout)?;
        }
        Ok(Some(settled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BetType, Selection};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn pending_bet(user_id: &str, matchup_id: &str, stake: Decimal) -> Bet {
        Bet {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            matchup_id: matchup_id.to_string(),
            week: 1,
            bet_type: BetType::Moneyline,
            selection: Selection::Roster(1),
            stake,
            odds: -110,
            line: None,
            potential_payout: stake * dec!(2),
            status: BetStatus::Pending,
            actual_payout: None,
            placed_at: Utc::now(),
            settled_at: None,
        }
    }

    #[test]
    fn test_conditional_debit() {
        let store = MemoryStore::new();
        assert_eq!(store.open_account("u1", dec!(100)), dec!(100));
        // Opening again keeps the existing balance
        assert_eq!(store.open_account("u1", dec!(500)), dec!(100));

        assert_eq!(store.debit_if_sufficient("u1", dec!(60)).unwrap(), dec!(40));
        let err = store.debit_if_sufficient("u1", dec!(41)).unwrap_err();
        assert!(matches!(err, StoreError::Insufficient { .. }));
        assert_eq!(store.balance("u1"), Some(dec!(40)));

        assert!(store.debit_if_sufficient("nobody", dec!(1)).is_err());
    }

    #[test]
    fn test_concurrent_debits_never_overdraw() {
        let store = Arc::new(MemoryStore::new());
        store.open_account("u1", dec!(100));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.debit_if_sufficient("u1", dec!(30)).is_ok())
            })
            .collect();
        let succeeded = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(succeeded, 3);
        assert_eq!(store.balance("u1"), Some(dec!(10)));
    }

    #[test]
    fn test_settle_only_once() {
        let store = MemoryStore::new();
        store.open_account("u1", dec!(80));
        let bet = pending_bet("u1", "lg:1:1", dec!(20));
        store.insert_bets(&[bet.clone()]).unwrap();

        let first = store
            .settle_bet(bet.id, BetStatus::Won, dec!(38), Utc::now())
            .unwrap();
        assert_eq!(first.unwrap().status, BetStatus::Won);
        assert_eq!(store.balance("u1"), Some(dec!(118)));

        let second = store
            .settle_bet(bet.id, BetStatus::Won, dec!(38), Utc::now())
            .unwrap();
        assert!(second.is_none());
        assert_eq!(store.balance("u1"), Some(dec!(118)));
        assert!(store.pending_bets_for_matchup("lg:1:1").is_empty());
    }

    #[test]
    fn test_duplicate_insert_stores_nothing() {
        let store = MemoryStore::new();
        let bet = pending_bet("u1", "lg:1:1", dec!(5));
        store.insert_bets(&[bet.clone()]).unwrap();

        let fresh = pending_bet("u1", "lg:1:1", dec!(5));
        let err = store.insert_bets(&[fresh, bet]).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateBet(_)));
        assert_eq!(store.all_bets().len(), 1);
    }

    #[test]
    fn test_snapshot_restores_state() {
        let store = MemoryStore::new();
        store.open_account("u1", dec!(100));
        store.insert_bets(&[pending_bet("u1", "lg:1:2", dec!(5))]).unwrap();

        let restored = MemoryStore::from_snapshot(store.snapshot());
        assert_eq!(restored.snapshot(), store.snapshot());
        assert_eq!(restored.bets_for_user("u1").len(), 1);
        assert_eq!(restored.pending_bets_for_matchup("lg:1:2").len(), 1);
    }
}
