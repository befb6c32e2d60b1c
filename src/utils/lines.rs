use crate::models::{BetRequest, BetType, BettingLine, Matchup, Selection, TeamRecord};
use crate::utils::odds::{
    probability_to_american_odds, round_to_half, spread_to_win_probability, STANDARD_VIG_ODDS,
};
use std::collections::HashMap;

/// Weekly scoring assumed for a team when nobody in the league has played
pub const DEFAULT_TEAM_POINTS: f64 = 100.0;

const SCORING_WEIGHT: f64 = 0.5;
const DIFFERENTIAL_WEIGHT: f64 = 0.25;
const RECORD_WEIGHT: f64 = 10.0;

/// Per-side inputs to the pricing model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeamProfile {
    pub avg_points_for: f64,
    pub avg_points_against: f64,
    pub win_pct: f64,
}

impl TeamProfile {
    fn average(league_avg: f64) -> Self {
        Self {
            avg_points_for: league_avg,
            avg_points_against: league_avg,
            win_pct: 0.5,
        }
    }

    fn from_record(record: &TeamRecord, league_avg: f64) -> Self {
        match (
            record.avg_points_for(),
            record.avg_points_against(),
            record.win_pct(),
        ) {
            (Some(avg_points_for), Some(avg_points_against), Some(win_pct)) => Self {
                avg_points_for,
                avg_points_against,
                win_pct,
            },
            _ => Self::average(league_avg),
        }
    }

    /// Power rating from scoring, scoring differential and record
    pub fn power_rating(&self) -> f64 {
        SCORING_WEIGHT * self.avg_points_for
            + DIFFERENTIAL_WEIGHT * (self.avg_points_for - self.avg_points_against)
            + RECORD_WEIGHT * (self.win_pct - 0.5)
    }
}

/// Derived numbers for one matchup, before they are split into lines
#[derive(Debug, Clone, PartialEq)]
pub struct MatchupPricing {
    pub matchup_id: String,
    pub week: u32,
    pub team_a: u32,
    pub team_b: u32,
    /// Points team A is favored by (negative when team B is the favorite)
    pub spread: f64,
    pub total: f64,
    pub team_a_odds: i32,
    pub team_b_odds: i32,
}

impl MatchupPricing {
    pub fn into_lines(self) -> Vec<BettingLine> {
        let line = |bet_type, selection, odds, line| BettingLine {
            matchup_id: self.matchup_id.clone(),
            week: self.week,
            bet_type,
            selection,
            odds,
            line,
        };
        // Avoid handing out a -0.0 line on pick'em games
        let a_line = if self.spread == 0.0 { 0.0 } else { -self.spread };
        let b_line = if self.spread == 0.0 { 0.0 } else { self.spread };

        vec![
            line(
                BetType::Spread,
                Selection::Roster(self.team_a),
                STANDARD_VIG_ODDS,
                Some(a_line),
            ),
            line(
                BetType::Spread,
                Selection::Roster(self.team_b),
                STANDARD_VIG_ODDS,
                Some(b_line),
            ),
            line(
                BetType::Total,
                Selection::Over,
                STANDARD_VIG_ODDS,
                Some(self.total),
            ),
            line(
                BetType::Total,
                Selection::Under,
                STANDARD_VIG_ODDS,
                Some(self.total),
            ),
            line(
                BetType::Moneyline,
                Selection::Roster(self.team_a),
                self.team_a_odds,
                None,
            ),
            line(
                BetType::Moneyline,
                Selection::Roster(self.team_b),
                self.team_b_odds,
                None,
            ),
        ]
    }
}

/// Average weekly points across teams that have played, if any have
fn league_average(rosters: &[TeamRecord]) -> f64 {
    let averages: Vec<f64> = rosters
        .iter()
        .filter_map(TeamRecord::avg_points_for)
        .collect();
    if averages.is_empty() {
        DEFAULT_TEAM_POINTS
    } else {
        averages.iter().sum::<f64>() / averages.len() as f64
    }
}

/// Price a single matchup from the two sides' profiles
pub fn price_matchup(matchup: &Matchup, a: &TeamProfile, b: &TeamProfile) -> MatchupPricing {
    let spread = round_to_half(a.power_rating() - b.power_rating());
    let total = round_to_half(a.avg_points_for + b.avg_points_for);

    let team_a_prob = spread_to_win_probability(spread);

    MatchupPricing {
        matchup_id: matchup.key(),
        week: matchup.week,
        team_a: matchup.team_a.roster_id,
        team_b: matchup.team_b.roster_id,
        spread,
        total,
        team_a_odds: probability_to_american_odds(team_a_prob),
        team_b_odds: probability_to_american_odds(1.0 - team_a_prob),
    }
}

/// Build every betting line for the given week's matchups
///
/// Teams with no games played (or missing from `rosters`) are priced as
/// league average, so week one produces pick'em spreads and a default total.
pub fn generate_lines(matchups: &[Matchup], rosters: &[TeamRecord], week: u32) -> Vec<BettingLine> {
    let league_avg = league_average(rosters);
    let records: HashMap<u32, &TeamRecord> = rosters.iter().map(|r| (r.roster_id, r)).collect();
    let profile = |roster_id: u32| {
        records
            .get(&roster_id)
            .map(|record| TeamProfile::from_record(record, league_avg))
            .unwrap_or_else(|| TeamProfile::average(league_avg))
    };

    let mut week_matchups: Vec<&Matchup> = matchups.iter().filter(|m| m.week == week).collect();
    week_matchups.sort_by_key(|m| m.matchup_number);

    week_matchups
        .into_iter()
        .flat_map(|matchup| {
            let a = profile(matchup.team_a.roster_id);
            let b = profile(matchup.team_b.roster_id);
            price_matchup(matchup, &a, &b).into_lines()
        })
        .collect()
}

/// The offered line a client request refers to, if it exists
pub fn find_offered_line<'a>(
    lines: &'a [BettingLine],
    request: &BetRequest,
) -> Option<&'a BettingLine> {
    lines.iter().find(|line| {
        line.matchup_id == request.matchup_id
            && line.bet_type == request.bet_type
            && line.selection == request.selection
    })
}
