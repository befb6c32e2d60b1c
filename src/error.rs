//! Error types for the sportsbook.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{BetType, Selection};

/// Top-level error for library operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// A wager batch was rejected.
    #[error(transparent)]
    Wager(#[from] WagerError),

    /// Ledger storage failed.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Request identity could not be established.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// The league data provider could not supply what a write path needs.
    #[error("league data error: {0}")]
    Upstream(String),

    /// Settlement was asked for a week that is still being played.
    #[error("week {week} is not finished (current week is {current_week})")]
    WeekNotFinished { week: u32, current_week: u32 },

    /// CSV writing error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reasons a bet batch is refused. Nothing is committed when one of these
/// is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WagerError {
    /// The weekly lock window is in effect.
    #[error("betting is closed")]
    BettingClosed,

    /// The batch stakes add up to more than the user holds.
    #[error("insufficient balance: need {required}, have {available}")]
    InsufficientBalance {
        /// Sum of the batch stakes.
        required: Decimal,
        /// Balance at evaluation time.
        available: Decimal,
    },

    #[error("bet batch is empty")]
    EmptyBatch,

    /// Stake must be positive and in whole cents.
    #[error("bet {index}: stake must be a positive amount in cents, got {stake}")]
    InvalidStake { index: usize, stake: Decimal },

    #[error("bet {index}: missing {field}")]
    MissingField { index: usize, field: &'static str },

    #[error("bet {index}: {selection} is not a valid {bet_type} selection")]
    InvalidSelection {
        index: usize,
        bet_type: BetType,
        selection: Selection,
    },

    /// No line is currently offered for this matchup/market/selection.
    #[error("bet {index}: no {bet_type} line offered for {selection} in {matchup_id}")]
    UnknownLine {
        index: usize,
        matchup_id: String,
        bet_type: BetType,
        selection: Selection,
    },
}

impl WagerError {
    /// Business-rule rejections, as opposed to malformed input
    pub fn is_business_rule(&self) -> bool {
        matches!(
            self,
            WagerError::BettingClosed | WagerError::InsufficientBalance { .. }
        )
    }
}

/// Ledger storage errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Conditional debit refused.
    #[error("insufficient funds for {user_id}: need {required}, have {available}")]
    Insufficient {
        user_id: String,
        required: Decimal,
        available: Decimal,
    },

    #[error("unknown bet {0}")]
    UnknownBet(uuid::Uuid),

    #[error("duplicate bet {0}")]
    DuplicateBet(uuid::Uuid),

    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot format error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Session token errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("malformed bearer token")]
    Malformed,

    #[error("invalid token signature")]
    BadSignature,

    #[error("admin access required")]
    Forbidden,
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, AppError>;
