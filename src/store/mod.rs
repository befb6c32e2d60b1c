//! Persistence port for balances and bets.
//!
//! The ledger only needs the handful of operations below; it never reads a
//! balance and writes it back, so implementations must make the debit and
//! the settle transition atomic.

pub mod memory;

pub use memory::{LedgerSnapshot, MemoryStore};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Bet, BetStatus};

/// Storage operations for FAAB balances and wagers.
///
/// # Implementation Notes
///
/// - Implementations must be thread-safe (`Send + Sync`)
/// - `debit_if_sufficient` must check and decrement as one step
/// - `settle_bet` must only succeed once per bet id
pub trait BetStore: Send + Sync {
    /// Create the account at `starting` if it does not exist. Returns the balance.
    fn open_account(&self, user_id: &str, starting: Decimal) -> Decimal;

    /// Current balance, if the account exists.
    fn balance(&self, user_id: &str) -> Option<Decimal>;

    /// Subtract `amount` only if the balance covers it. Returns the new balance.
    fn debit_if_sufficient(&self, user_id: &str, amount: Decimal) -> Result<Decimal, StoreError>;

    /// Add `amount` to the balance. Returns the new balance.
    fn credit(&self, user_id: &str, amount: Decimal) -> Result<Decimal, StoreError>;

    /// Record new bets. Either all are stored or none are.
    fn insert_bets(&self, bets: &[Bet]) -> Result<(), StoreError>;

    /// Every bet placed by a user, oldest first.
    fn bets_for_user(&self, user_id: &str) -> Vec<Bet>;

    /// Pending bets on a matchup, oldest first.
    fn pending_bets_for_matchup(&self, matchup_id: &str) -> Vec<Bet>;

    /// Every bet in the ledger, oldest first.
    fn all_bets(&self) -> Vec<Bet>;

    /// Move a pending bet to a terminal status and credit `payout` to its owner.
    ///
    /// Returns `Ok(None)` without crediting when the bet was already settled.
    fn settle_bet(
        &self,
        bet_id: Uuid,
        status: BetStatus,
        payout: Decimal,
        settled_at: DateTime<Utc>,
    ) -> Result<Option<Bet>, StoreError>;
}
