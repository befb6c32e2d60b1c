//! Server-rendered league page.

use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use chrono::Utc;

use super::handlers::AppState;
use crate::models::{BetType, BettingLine, Selection};
use crate::utils::stats::{standings, Standing};

// Custom filters for formatting
mod filters {
    pub fn format_odds(odds: &i32) -> ::askama::Result<String> {
        Ok(format!("{:+}", odds))
    }

    pub fn format_points(value: &f64) -> ::askama::Result<String> {
        Ok(format!("{:.2}", value))
    }
}

/// One market row as shown on the page
#[derive(Debug, Clone)]
pub struct LineRow {
    pub matchup_id: String,
    pub market: String,
    pub pick: String,
    pub odds: i32,
}

impl LineRow {
    fn new(line: &BettingLine, team_name: impl Fn(u32) -> String) -> Self {
        let pick = match (line.selection, line.line) {
            (Selection::Roster(id), Some(points)) if line.bet_type == BetType::Spread => {
                format!("{} {:+.1}", team_name(id), points)
            }
            (Selection::Roster(id), _) => team_name(id),
            (Selection::Over, Some(points)) => format!("Over {:.1}", points),
            (Selection::Under, Some(points)) => format!("Under {:.1}", points),
            (other, _) => other.to_string(),
        };
        Self {
            matchup_id: line.matchup_id.clone(),
            market: line.bet_type.to_string(),
            pick,
            odds: line.odds,
        }
    }
}

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    league_id: String,
    week: u32,
    locked: bool,
    standings: Vec<Standing>,
    lines: Vec<LineRow>,
}

struct HtmlTemplate<T>(T);

impl<T> IntoResponse for HtmlTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

/// Standings and this week's lines
pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    let league = state.league.read().await;

    let table = standings(&league.rosters, &league.users);
    let team_name = |roster_id: u32| {
        table
            .iter()
            .find(|s| s.roster_id == roster_id)
            .map(|s| s.team_name.clone())
            .unwrap_or_else(|| format!("Team {}", roster_id))
    };
    let lines = league
        .lines_for_week(league.current_week)
        .iter()
        .map(|line| LineRow::new(line, team_name))
        .collect();

    let template = HomeTemplate {
        league_id: league.league_id.clone(),
        week: league.current_week,
        locked: state.ledger.lock_window().is_locked(Utc::now()),
        standings: table,
        lines,
    };

    HtmlTemplate(template)
}
