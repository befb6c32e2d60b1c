pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod server;
pub mod store;
pub mod utils;

pub use api::*;
pub use config::Config;
pub use error::{AppError, Result};
pub use models::*;
pub use utils::*;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use store::BetStore;
use tracing::{info, warn};
use utils::ledger::{Ledger, SettlementSummary};
use utils::lines::generate_lines;

/// Week used when the provider cannot tell us the current one
pub const FALLBACK_WEEK: u32 = 1;

/// Where `LeagueData::current_week` came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekSource {
    Provider,
    /// The provider could not be reached; the week is a placeholder
    Fallback,
}

/// Everything we pull from the league data provider
#[derive(Debug, Clone, Serialize)]
pub struct LeagueData {
    pub league_id: String,
    pub current_week: u32,
    pub week_source: WeekSource,
    /// Set when any part of the fetch failed and was replaced with a default
    pub degraded: bool,
    pub users: Vec<LeagueUser>,
    pub rosters: Vec<TeamRecord>,
    pub matchups: BTreeMap<u32, Vec<Matchup>>,
}

impl LeagueData {
    pub fn empty(league_id: impl Into<String>) -> Self {
        Self {
            league_id: league_id.into(),
            current_week: FALLBACK_WEEK,
            week_source: WeekSource::Fallback,
            degraded: true,
            users: Vec::new(),
            rosters: Vec::new(),
            matchups: BTreeMap::new(),
        }
    }

    /// Fail unless this data is complete enough to take or settle wagers
    pub fn ensure_writable(&self) -> Result<()> {
        if self.degraded || self.week_source == WeekSource::Fallback {
            return Err(AppError::Upstream(format!(
                "league {} data is incomplete, wagers are paused",
                self.league_id
            )));
        }
        Ok(())
    }

    /// Take `fresh` unless it is degraded and the data held now is not
    ///
    /// Returns whether the data was replaced.
    pub fn refresh(&mut self, fresh: LeagueData) -> bool {
        if fresh.degraded && !self.degraded {
            warn!(
                league_id = %self.league_id,
                week = self.current_week,
                "League data refresh degraded, keeping previous data"
            );
            return false;
        }
        *self = fresh;
        true
    }

    pub fn matchups_for_week(&self, week: u32) -> &[Matchup] {
        self.matchups.get(&week).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Price the given week from the current roster state
    pub fn lines_for_week(&self, week: u32) -> Vec<BettingLine> {
        generate_lines(self.matchups_for_week(week), &self.rosters, week)
    }
}

/// Fetch league data, degrading to empty pieces when the provider fails
///
/// Read paths must keep working on stale or missing data, so every failure
/// is logged and replaced with a safe default instead of propagated.
pub async fn fetch_league_data(client: &SleeperClient) -> LeagueData {
    let mut data = LeagueData::empty(client.league_id());

    let mut degraded = false;

    match client.fetch_current_week().await {
        Ok(week) if week > 0 => {
            data.current_week = week;
            data.week_source = WeekSource::Provider;
        }
        Ok(_) => degraded = true,
        Err(e) => {
            warn!(error = %e, "Failed to fetch current week, using week {}", FALLBACK_WEEK);
            degraded = true;
        }
    }

    data.users = client.fetch_users().await.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to fetch league users");
        degraded = true;
        Vec::new()
    });

    data.rosters = client.fetch_rosters().await.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to fetch rosters");
        degraded = true;
        Vec::new()
    });

    let matchups = client
        .fetch_matchups(data.current_week)
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, week = data.current_week, "Failed to fetch matchups");
            degraded = true;
            Vec::new()
        });
    data.matchups.insert(data.current_week, matchups);
    data.degraded = degraded;

    info!(
        league_id = %data.league_id,
        week = data.current_week,
        degraded = data.degraded,
        rosters = data.rosters.len(),
        matchups = data.matchups_for_week(data.current_week).len(),
        "Loaded league data"
    );
    data
}

/// Weeks before `current_week` that still have pending bets
pub fn weeks_awaiting_settlement<S: BetStore>(ledger: &Ledger<S>, current_week: u32) -> Vec<u32> {
    let weeks: BTreeSet<u32> = ledger
        .store()
        .all_bets()
        .into_iter()
        .filter(|bet| !bet.status.is_settled() && bet.week < current_week)
        .map(|bet| bet.week)
        .collect();
    weeks.into_iter().collect()
}

/// Settle one week using the provider's matchup scores as final
pub async fn settle_week<S: BetStore>(
    client: &SleeperClient,
    ledger: &Ledger<S>,
    week: u32,
    now: DateTime<Utc>,
) -> Result<SettlementSummary> {
    let matchups = client
        .fetch_matchups(week)
        .await
        .map_err(|e| AppError::Upstream(format!("week {} matchups: {:#}", week, e)))?;
    let results: Vec<MatchupResult> = matchups.iter().map(MatchupResult::from_matchup).collect();
    ledger.settle(&results, now)
}

/// Settle every finished week that still has pending bets
///
/// A week is finished once the provider has moved past it. Weeks whose
/// scores cannot be fetched are left pending for the next pass.
pub async fn settle_completed_weeks<S: BetStore>(
    client: &SleeperClient,
    ledger: &Ledger<S>,
    current_week: u32,
    now: DateTime<Utc>,
) -> SettlementSummary {
    let mut total = SettlementSummary::default();
    for week in weeks_awaiting_settlement(ledger, current_week) {
        match settle_week(client, ledger, week, now).await {
            Ok(summary) => {
                total.matchups += summary.matchups;
                total.settled += summary.settled;
                total.won += summary.won;
                total.lost += summary.lost;
                total.pushed += summary.pushed;
                total.skipped += summary.skipped;
                total.credited += summary.credited;
            }
            Err(e) => warn!(week, error = %e, "Settlement deferred"),
        }
    }
    total
}
