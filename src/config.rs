//! Application configuration loaded from environment variables.

use chrono::{NaiveTime, Weekday};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::PathBuf;

use crate::api::SLEEPER_BASE_URL;
use crate::utils::lock_window::LockWindow;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === League ===
    /// Sleeper league id served by this process.
    pub league_id: String,

    /// Sleeper API base URL.
    #[serde(default = "default_sleeper_url")]
    pub sleeper_base_url: String,

    /// Seconds between league data refreshes.
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,

    // === Betting ===
    /// FAAB budget a new account starts with.
    #[serde(default = "default_starting_balance")]
    pub starting_balance: Decimal,

    /// IANA zone the lock window is evaluated in.
    #[serde(default = "default_lock_timezone")]
    pub lock_timezone: String,

    /// Day betting locks (e.g. "thu").
    #[serde(default = "default_lock_weekday")]
    pub lock_weekday: String,

    /// Local time betting locks, HH:MM.
    #[serde(default = "default_lock_time")]
    pub lock_time: String,

    // === Sessions ===
    /// Key used to sign bearer tokens.
    pub session_secret: String,

    /// Sleeper user ids allowed to trigger settlement, comma separated.
    #[serde(default)]
    pub admin_user_ids: Vec<String>,

    // === Storage / Server ===
    /// JSON snapshot of balances and bets.
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,

    /// Address the web server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_sleeper_url() -> String {
    SLEEPER_BASE_URL.to_string()
}

fn default_refresh_secs() -> u64 {
    60
}

fn default_starting_balance() -> Decimal {
    Decimal::new(100, 0)
}

fn default_lock_timezone() -> String {
    "America/New_York".to_string()
}

fn default_lock_weekday() -> String {
    "thu".to_string()
}

fn default_lock_time() -> String {
    "20:20".to_string()
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("data/ledger.json")
}

fn default_bind_addr() -> String {
    "127.0.0.1:3000".to_string()
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenv::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.league_id.trim().is_empty() {
            return Err("LEAGUE_ID is required".to_string());
        }

        if self.session_secret.len() < 16 {
            return Err("SESSION_SECRET must be at least 16 characters".to_string());
        }

        if self.starting_balance < Decimal::ZERO {
            return Err("STARTING_BALANCE must not be negative".to_string());
        }

        if self.refresh_secs == 0 {
            return Err("REFRESH_SECS must be greater than 0".to_string());
        }

        self.lock_window().map(|_| ())
    }

    /// Build the lock window from the configured zone, day and time.
    pub fn lock_window(&self) -> Result<LockWindow, String> {
        let tz: Tz = self
            .lock_timezone
            .parse()
            .map_err(|_| format!("LOCK_TIMEZONE {} is not a known zone", self.lock_timezone))?;
        let weekday: Weekday = self
            .lock_weekday
            .parse()
            .map_err(|_| format!("LOCK_WEEKDAY {} is not a weekday", self.lock_weekday))?;
        let time = NaiveTime::parse_from_str(&self.lock_time, "%H:%M")
            .map_err(|e| format!("LOCK_TIME {} is not HH:MM: {}", self.lock_time, e))?;
        Ok(LockWindow::new(tz, weekday, time))
    }
}
