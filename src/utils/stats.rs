use crate::models::{Bet, BetStatus, LeagueUser, TeamRecord};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Summary of a set of bets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BetStats {
    pub total_bets: usize,
    pub total_stake: Decimal,
    /// Won payouts plus pushed stakes returned
    pub total_payout: Decimal,
    pub settled_stake: Decimal,
    pub net_profit: Decimal,
    /// Won over settled, 0 when nothing has settled
    pub win_rate: f64,
    pub won_count: usize,
    pub lost_count: usize,
    pub push_count: usize,
    pub pending_count: usize,
    pub pending_stake: Decimal,
}

pub fn compute_stats(bets: &[Bet]) -> BetStats {
    let mut stats = BetStats {
        total_bets: bets.len(),
        ..Default::default()
    };

    for bet in bets {
        stats.total_stake += bet.stake;
        match bet.status {
            BetStatus::Pending => {
                stats.pending_count += 1;
                stats.pending_stake += bet.stake;
                continue;
            }
            BetStatus::Won => {
                stats.won_count += 1;
                stats.total_payout += bet.actual_payout.unwrap_or(bet.potential_payout);
            }
            BetStatus::Push => {
                stats.push_count += 1;
                stats.total_payout += bet.actual_payout.unwrap_or(bet.stake);
            }
            BetStatus::Lost => stats.lost_count += 1,
        }
        stats.settled_stake += bet.stake;
    }

    stats.net_profit = stats.total_payout - stats.settled_stake;
    let settled = stats.won_count + stats.lost_count + stats.push_count;
    if settled > 0 {
        stats.win_rate = stats.won_count as f64 / settled as f64;
    }
    stats
}

/// One row of the FAAB adjustment export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaabAdjustment {
    #[serde(rename = "Roster ID")]
    pub roster_id: u32,
    #[serde(rename = "Team Name")]
    pub team_name: String,
    #[serde(rename = "Owner Name")]
    pub owner_name: String,
    #[serde(rename = "FAAB Adjustment")]
    pub adjustment: Decimal,
    #[serde(rename = "Notes")]
    pub notes: String,
}

/// Net betting result per roster owner, ordered by roster id
pub fn faab_report(rosters: &[TeamRecord], users: &[LeagueUser], bets: &[Bet]) -> Vec<FaabAdjustment> {
    let users: HashMap<&str, &LeagueUser> =
        users.iter().map(|u| (u.user_id.as_str(), u)).collect();
    let mut bets_by_user: HashMap<&str, Vec<Bet>> = HashMap::new();
    for bet in bets {
        bets_by_user
            .entry(bet.user_id.as_str())
            .or_default()
            .push(bet.clone());
    }

    let mut rosters: Vec<&TeamRecord> = rosters.iter().collect();
    rosters.sort_by_key(|r| r.roster_id);

    rosters
        .into_iter()
        .map(|roster| {
            let owner = roster
                .owner_id
                .as_deref()
                .and_then(|id| users.get(id).copied());
            let owner_name = owner
                .map(|u| u.display_name.clone())
                .unwrap_or_else(|| "Unowned".to_string());
            let team_name = owner
                .and_then(|u| u.team_name.clone())
                .unwrap_or_else(|| format!("Team {}", roster.roster_id));
            let stats = roster
                .owner_id
                .as_deref()
                .and_then(|id| bets_by_user.get(id))
                .map(|bets| compute_stats(bets))
                .unwrap_or_default();

            FaabAdjustment {
                roster_id: roster.roster_id,
                team_name,
                owner_name,
                adjustment: stats.net_profit,
                notes: format!(
                    "{}W-{}L-{}P, {} pending",
                    stats.won_count, stats.lost_count, stats.push_count, stats.pending_count
                ),
            }
        })
        .collect()
}

/// Standings row for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standing {
    pub rank: usize,
    pub roster_id: u32,
    pub team_name: String,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub points_for: f64,
}

/// League table ordered by wins, then points scored
pub fn standings(rosters: &[TeamRecord], users: &[LeagueUser]) -> Vec<Standing> {
    let mut sorted: Vec<&TeamRecord> = rosters.iter().collect();
    sorted.sort_by(|a, b| {
        b.wins
            .cmp(&a.wins)
            .then(
                b.points_for
                    .partial_cmp(&a.points_for)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
            .then(a.roster_id.cmp(&b.roster_id))
    });

    sorted
        .into_iter()
        .enumerate()
        .map(|(i, roster)| {
            let team_name = roster
                .owner_id
                .as_deref()
                .and_then(|id| users.iter().find(|u| u.user_id == id))
                .map(|u| u.team_name.clone().unwrap_or_else(|| u.display_name.clone()))
                .unwrap_or_else(|| format!("Team {}", roster.roster_id));
            Standing {
                rank: i + 1,
                roster_id: roster.roster_id,
                team_name,
                wins: roster.wins,
                losses: roster.losses,
                ties: roster.ties,
                points_for: roster.points_for,
            }
        })
        .collect()
}
