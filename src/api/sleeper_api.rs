use crate::models::{LeagueUser, Matchup, MatchupSide, TeamRecord};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

pub const SLEEPER_BASE_URL: &str = "https://api.sleeper.app/v1";

/// Response from `/state/nfl`
#[derive(Debug, Deserialize)]
struct NflState {
    week: u32,
    #[serde(default)]
    season: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SleeperUser {
    user_id: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    metadata: Option<SleeperUserMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct SleeperUserMetadata {
    #[serde(default)]
    team_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SleeperRoster {
    roster_id: u32,
    #[serde(default)]
    owner_id: Option<String>,
    #[serde(default)]
    settings: SleeperRosterSettings,
}

/// Season totals; points are split into whole and hundredths fields
#[derive(Debug, Default, Deserialize)]
struct SleeperRosterSettings {
    #[serde(default)]
    wins: u32,
    #[serde(default)]
    losses: u32,
    #[serde(default)]
    ties: u32,
    #[serde(default)]
    fpts: u32,
    #[serde(default)]
    fpts_decimal: u32,
    #[serde(default)]
    fpts_against: u32,
    #[serde(default)]
    fpts_against_decimal: u32,
}

/// One roster's entry in a week's matchup list
#[derive(Debug, Clone, Deserialize)]
pub struct SleeperMatchupEntry {
    pub roster_id: u32,
    /// Absent for rosters on bye
    #[serde(default)]
    pub matchup_id: Option<u32>,
    #[serde(default)]
    pub points: Option<f64>,
}

/// Read-only client for the Sleeper fantasy API
pub struct SleeperClient {
    base_url: String,
    league_id: String,
    client: reqwest::Client,
}

impl SleeperClient {
    pub fn new(base_url: impl Into<String>, league_id: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            league_id: league_id.into(),
            client,
        }
    }

    pub fn league_id(&self) -> &str {
        &self.league_id
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!("Sleeper API returned error {} for {}", response.status(), url);
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse response from {}", url))
    }

    /// Current NFL week according to the provider
    pub async fn fetch_current_week(&self) -> Result<u32> {
        let state: NflState = self.get_json("/state/nfl").await?;
        tracing::debug!(week = state.week, season = ?state.season, "Fetched NFL state");
        Ok(state.week)
    }

    pub async fn fetch_users(&self) -> Result<Vec<LeagueUser>> {
        let users: Vec<SleeperUser> = self
            .get_json(&format!("/league/{}/users", self.league_id))
            .await?;
        Ok(users
            .into_iter()
            .map(|user| LeagueUser {
                display_name: user
                    .display_name
                    .unwrap_or_else(|| user.user_id.clone()),
                team_name: user.metadata.and_then(|m| m.team_name),
                user_id: user.user_id,
            })
            .collect())
    }

    pub async fn fetch_rosters(&self) -> Result<Vec<TeamRecord>> {
        let rosters: Vec<SleeperRoster> = self
            .get_json(&format!("/league/{}/rosters", self.league_id))
            .await?;
        Ok(rosters.into_iter().map(roster_to_record).collect())
    }

    pub async fn fetch_matchups(&self, week: u32) -> Result<Vec<Matchup>> {
        let entries: Vec<SleeperMatchupEntry> = self
            .get_json(&format!("/league/{}/matchups/{}", self.league_id, week))
            .await?;
        Ok(pair_matchups(&self.league_id, week, entries))
    }
}

fn roster_to_record(roster: SleeperRoster) -> TeamRecord {
    let s = roster.settings;
    TeamRecord {
        roster_id: roster.roster_id,
        owner_id: roster.owner_id,
        wins: s.wins,
        losses: s.losses,
        ties: s.ties,
        points_for: s.fpts as f64 + s.fpts_decimal as f64 / 100.0,
        points_against: s.fpts_against as f64 + s.fpts_against_decimal as f64 / 100.0,
    }
}

/// Group matchup entries into head-to-head pairs
///
/// Entries without a matchup id, or whose matchup id does not have exactly
/// two rosters, are dropped. The lower roster id becomes team A.
pub fn pair_matchups(league_id: &str, week: u32, entries: Vec<SleeperMatchupEntry>) -> Vec<Matchup> {
    let mut grouped: BTreeMap<u32, Vec<SleeperMatchupEntry>> = BTreeMap::new();
    for entry in entries {
        if let Some(matchup_id) = entry.matchup_id {
            grouped.entry(matchup_id).or_default().push(entry);
        }
    }

    grouped
        .into_iter()
        .filter_map(|(matchup_number, mut sides)| {
            if sides.len() != 2 {
                tracing::warn!(
                    matchup_number,
                    sides = sides.len(),
                    "Skipping matchup without exactly two rosters"
                );
                return None;
            }
            sides.sort_by_key(|side| side.roster_id);
            let side = |entry: &SleeperMatchupEntry| MatchupSide {
                roster_id: entry.roster_id,
                points: entry.points.unwrap_or(0.0),
            };
            Some(Matchup {
                league_id: league_id.to_string(),
                week,
                matchup_number,
                team_a: side(&sides[0]),
                team_b: side(&sides[1]),
            })
        })
        .collect()
}
