use crate::error::{AppError, Result, StoreError, WagerError};
use crate::models::{Bet, BetRequest, BetStatus, BetType, BettingLine, MatchupResult, Selection};
use crate::store::BetStore;
use crate::utils::lock_window::LockWindow;
use crate::utils::odds::potential_payout;
use crate::utils::stats::{compute_stats, BetStats};
use crate::utils::validator::{batch_total, match_offered_lines, validate};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

const SCORE_EPSILON: f64 = 1e-9;

/// Outcome of a bet batch submission
#[derive(Debug, Clone, Serialize)]
pub struct PlacementReceipt {
    pub requested: usize,
    pub placed: usize,
    pub balance: Decimal,
    pub bets: Vec<Bet>,
}

/// Counts from one settlement pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettlementSummary {
    pub matchups: usize,
    pub settled: usize,
    pub won: usize,
    pub lost: usize,
    pub pushed: usize,
    /// Pending bets left alone because the result did not cover their selection
    pub skipped: usize,
    pub credited: Decimal,
}

/// Records wagers against FAAB balances and settles them
pub struct Ledger<S: BetStore> {
    store: Arc<S>,
    lock_window: LockWindow,
    starting_balance: Decimal,
}

impl<S: BetStore> Ledger<S> {
    pub fn new(store: Arc<S>, lock_window: LockWindow, starting_balance: Decimal) -> Self {
        Self {
            store,
            lock_window,
            starting_balance,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn lock_window(&self) -> &LockWindow {
        &self.lock_window
    }

    /// Current balance, opening the account at the starting budget if needed
    pub fn balance(&self, user_id: &str) -> Decimal {
        self.store.open_account(user_id, self.starting_balance)
    }

    /// Bet history for a user with summary stats
    pub fn history(&self, user_id: &str) -> (Vec<Bet>, BetStats) {
        let bets = self.store.bets_for_user(user_id);
        let stats = compute_stats(&bets);
        (bets, stats)
    }

    /// Validate and commit a batch of bets as one unit
    ///
    /// The batch is priced from `offered` lines, never from client input.
    /// The total stake is taken with a single conditional debit, so a
    /// concurrent batch for the same user cannot spend the same balance.
    pub fn place_bets(
        &self,
        user_id: &str,
        requests: &[BetRequest],
        offered: &[BettingLine],
        now: DateTime<Utc>,
    ) -> Result<PlacementReceipt> {
        let balance = self.balance(user_id);
        validate(balance, requests, self.lock_window.is_locked(now))?;
        let priced = match_offered_lines(requests, offered)?;

        let total = batch_total(requests);
        let new_balance = self
            .store
            .debit_if_sufficient(user_id, total)
            .map_err(|e| -> AppError {
                match e {
                    StoreError::Insufficient {
                        required,
                        available,
                        ..
                    } => WagerError::InsufficientBalance {
                        required,
                        available,
                    }
                    .into(),
                    other => other.into(),
                }
            })?;

        let bets: Vec<Bet> = requests
            .iter()
            .zip(priced)
            .map(|(request, line)| Bet {
                id: Uuid::new_v4(),
                user_id: user_id.to_string(),
                matchup_id: request.matchup_id.clone(),
                week: line.week,
                bet_type: request.bet_type,
                selection: request.selection,
                stake: request.stake,
                odds: line.odds,
                line: line.line,
                potential_payout: potential_payout(request.stake, line.odds),
                status: BetStatus::Pending,
                actual_payout: None,
                placed_at: now,
                settled_at: None,
            })
            .collect();

        if let Err(e) = self.store.insert_bets(&bets) {
            warn!(user_id, error = %e, "Failed to record bets, refunding {}", total);
            self.store.credit(user_id, total)?;
            return Err(e.into());
        }

        info!(
            user_id,
            placed = bets.len(),
            stake = %total,
            balance = %new_balance,
            "Placed bet batch"
        );

        Ok(PlacementReceipt {
            requested: requests.len(),
            placed: bets.len(),
            balance: new_balance,
            bets,
        })
    }

    /// Grade every pending bet on the given final results
    ///
    /// Safe to run repeatedly: bets already settled are skipped and never
    /// credited twice.
    pub fn settle(&self, results: &[MatchupResult], now: DateTime<Utc>) -> Result<SettlementSummary> {
        let mut summary = SettlementSummary {
            matchups: results.len(),
            ..Default::default()
        };

        for result in results {
            for bet in self.store.pending_bets_for_matchup(&result.matchup_id) {
                let Some(status) = grade(&bet, result) else {
                    warn!(bet_id = %bet.id, matchup_id = %result.matchup_id, "Result does not cover bet selection");
                    summary.skipped += 1;
                    continue;
                };
                let payout = match status {
                    BetStatus::Won => bet.potential_payout,
                    BetStatus::Push => bet.stake,
                    BetStatus::Lost | BetStatus::Pending => Decimal::ZERO,
                };

                match self.store.settle_bet(bet.id, status, payout, now)? {
                    Some(settled) => {
                        debug!(bet_id = %settled.id, ?status, %payout, "Settled bet");
                        summary.settled += 1;
                        summary.credited += payout;
                        match status {
                            BetStatus::Won => summary.won += 1,
                            BetStatus::Lost => summary.lost += 1,
                            BetStatus::Push => summary.pushed += 1,
                            BetStatus::Pending => {}
                        }
                    }
                    None => debug!(bet_id = %bet.id, "Bet already settled"),
                }
            }
        }

        info!(
            matchups = summary.matchups,
            settled = summary.settled,
            credited = %summary.credited,
            "Settlement pass complete"
        );
        Ok(summary)
    }
}

fn compare(value: f64) -> BetStatus {
    if value > SCORE_EPSILON {
        BetStatus::Won
    } else if value < -SCORE_EPSILON {
        BetStatus::Lost
    } else {
        BetStatus::Push
    }
}

/// Terminal status for a bet given the final score, if the result applies
pub fn grade(bet: &Bet, result: &MatchupResult) -> Option<BetStatus> {
    match (bet.bet_type, bet.selection) {
        (BetType::Spread, Selection::Roster(roster_id)) => {
            let margin = result.points_for(roster_id)? - result.points_against(roster_id)?;
            Some(compare(margin + bet.line.unwrap_or(0.0)))
        }
        (BetType::Moneyline, Selection::Roster(roster_id)) => {
            let margin = result.points_for(roster_id)? - result.points_against(roster_id)?;
            Some(compare(margin))
        }
        (BetType::Total, Selection::Over) => {
            Some(compare(result.combined_points() - bet.line?))
        }
        (BetType::Total, Selection::Under) => {
            Some(compare(bet.line? - result.combined_points()))
        }
        _ => None,
    }
}
