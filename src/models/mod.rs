use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Season record and scoring for one roster
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub roster_id: u32,
    pub owner_id: Option<String>,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub points_for: f64,
    pub points_against: f64,
}

impl TeamRecord {
    pub fn games_played(&self) -> u32 {
        self.wins + self.losses + self.ties
    }

    /// Ties count as half a win
    pub fn win_pct(&self) -> Option<f64> {
        let games = self.games_played();
        if games == 0 {
            return None;
        }
        Some((self.wins as f64 + 0.5 * self.ties as f64) / games as f64)
    }

    pub fn avg_points_for(&self) -> Option<f64> {
        let games = self.games_played();
        (games > 0).then(|| self.points_for / games as f64)
    }

    pub fn avg_points_against(&self) -> Option<f64> {
        let games = self.games_played();
        (games > 0).then(|| self.points_against / games as f64)
    }
}

/// One side of a head-to-head fantasy matchup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchupSide {
    pub roster_id: u32,
    pub points: f64,
}

/// A paired weekly matchup between two rosters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matchup {
    pub league_id: String,
    pub week: u32,
    pub matchup_number: u32,
    pub team_a: MatchupSide,
    pub team_b: MatchupSide,
}

impl Matchup {
    /// Composite identity shared by lines and bets
    pub fn key(&self) -> String {
        matchup_key(&self.league_id, self.week, self.matchup_number)
    }

    pub fn side(&self, roster_id: u32) -> Option<&MatchupSide> {
        [&self.team_a, &self.team_b]
            .into_iter()
            .find(|side| side.roster_id == roster_id)
    }

    pub fn opponent(&self, roster_id: u32) -> Option<&MatchupSide> {
        if self.team_a.roster_id == roster_id {
            Some(&self.team_b)
        } else if self.team_b.roster_id == roster_id {
            Some(&self.team_a)
        } else {
            None
        }
    }
}

pub fn matchup_key(league_id: &str, week: u32, matchup_number: u32) -> String {
    format!("{}:{}:{}", league_id, week, matchup_number)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetType {
    Spread,
    Total,
    Moneyline,
}

impl fmt::Display for BetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BetType::Spread => "spread",
            BetType::Total => "total",
            BetType::Moneyline => "moneyline",
        };
        f.write_str(name)
    }
}

/// What a wager is on: a roster for sides, over/under for totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    Roster(u32),
    Over,
    Under,
}

impl Selection {
    pub fn fits(&self, bet_type: BetType) -> bool {
        match (bet_type, self) {
            (BetType::Total, Selection::Over | Selection::Under) => true,
            (BetType::Spread | BetType::Moneyline, Selection::Roster(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Roster(id) => write!(f, "roster {}", id),
            Selection::Over => f.write_str("over"),
            Selection::Under => f.write_str("under"),
        }
    }
}

/// A priced market offered for one selection of a matchup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BettingLine {
    pub matchup_id: String,
    pub week: u32,
    pub bet_type: BetType,
    pub selection: Selection,
    pub odds: i32, // American odds format (e.g., -110, +150)
    pub line: Option<f64>,
}

impl BettingLine {
    pub fn format(&self) -> String {
        match self.line {
            Some(line) if self.bet_type == BetType::Spread => format!(
                "{} | {} {} {:+.1} ({:+})",
                self.matchup_id, self.bet_type, self.selection, line, self.odds
            ),
            Some(line) => format!(
                "{} | {} {} {:.1} ({:+})",
                self.matchup_id, self.bet_type, self.selection, line, self.odds
            ),
            None => format!(
                "{} | {} {} ({:+})",
                self.matchup_id, self.bet_type, self.selection, self.odds
            ),
        }
    }
}

/// A wager as submitted by a client, before pricing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetRequest {
    pub matchup_id: String,
    pub bet_type: BetType,
    pub selection: Selection,
    pub stake: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BetStatus {
    Pending,
    Won,
    Lost,
    Push,
}

impl BetStatus {
    pub fn is_settled(&self) -> bool {
        !matches!(self, BetStatus::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bet {
    pub id: Uuid,
    pub user_id: String,
    pub matchup_id: String,
    pub week: u32,
    pub bet_type: BetType,
    pub selection: Selection,
    pub stake: Decimal,
    pub odds: i32,
    pub line: Option<f64>,
    pub potential_payout: Decimal,
    pub status: BetStatus,
    pub actual_payout: Option<Decimal>,
    pub placed_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

/// Final scoring for a matchup, used to grade bets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchupResult {
    pub matchup_id: String,
    pub scores: Vec<MatchupSide>,
}

impl MatchupResult {
    pub fn from_matchup(matchup: &Matchup) -> Self {
        Self {
            matchup_id: matchup.key(),
            scores: vec![matchup.team_a.clone(), matchup.team_b.clone()],
        }
    }

    pub fn points_for(&self, roster_id: u32) -> Option<f64> {
        self.scores
            .iter()
            .find(|side| side.roster_id == roster_id)
            .map(|side| side.points)
    }

    pub fn points_against(&self, roster_id: u32) -> Option<f64> {
        if !self.scores.iter().any(|side| side.roster_id == roster_id) {
            return None;
        }
        self.scores
            .iter()
            .find(|side| side.roster_id != roster_id)
            .map(|side| side.points)
    }

    pub fn combined_points(&self) -> f64 {
        self.scores.iter().map(|side| side.points).sum()
    }
}

/// League member as listed by the data provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueUser {
    pub user_id: String,
    pub display_name: String,
    pub team_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matchup() -> Matchup {
        Matchup {
            league_id: "league".to_string(),
            week: 3,
            matchup_number: 2,
            team_a: MatchupSide {
                roster_id: 1,
                points: 110.5,
            },
            team_b: MatchupSide {
                roster_id: 4,
                points: 98.0,
            },
        }
    }

    #[test]
    fn test_matchup_key_and_sides() {
        let m = matchup();
        assert_eq!(m.key(), "league:3:2");
        assert_eq!(m.opponent(1).map(|s| s.roster_id), Some(4));
        assert_eq!(m.opponent(4).map(|s| s.roster_id), Some(1));
        assert!(m.side(7).is_none());
    }

    #[test]
    fn test_selection_fits_bet_type() {
        assert!(Selection::Over.fits(BetType::Total));
        assert!(!Selection::Over.fits(BetType::Spread));
        assert!(Selection::Roster(1).fits(BetType::Moneyline));
        assert!(!Selection::Roster(1).fits(BetType::Total));
    }

    #[test]
    fn test_team_record_averages() {
        let record = TeamRecord {
            roster_id: 1,
            wins: 3,
            losses: 1,
            points_for: 480.0,
            points_against: 400.0,
            ..Default::default()
        };
        assert_eq!(record.avg_points_for(), Some(120.0));
        assert_eq!(record.win_pct(), Some(0.75));
        assert_eq!(TeamRecord::default().win_pct(), None);
    }

    #[test]
    fn test_result_points() {
        let result = MatchupResult::from_matchup(&matchup());
        assert_eq!(result.points_for(1), Some(110.5));
        assert_eq!(result.points_against(1), Some(98.0));
        assert_eq!(result.points_against(9), None);
        assert!((result.combined_points() - 208.5).abs() < 1e-9);
    }

    #[test]
    fn test_selection_serde_shape() {
        let json = serde_json::to_string(&Selection::Roster(3)).unwrap();
        assert_eq!(json, r#"{"roster":3}"#);
        let over: Selection = serde_json::from_str(r#""over""#).unwrap();
        assert_eq!(over, Selection::Over);
    }
}
