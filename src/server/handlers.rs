//! HTTP API handlers.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};

use super::auth::{AdminUser, AuthUser, SessionKeys};
use crate::api::SleeperClient;
use crate::error::{AppError, AuthError, WagerError};
use crate::models::{Bet, BetRequest, BettingLine};
use crate::store::{BetStore, MemoryStore};
use crate::utils::data::{save_snapshot, write_faab_report};
use crate::utils::ledger::{Ledger, PlacementReceipt, SettlementSummary};
use crate::utils::stats::{faab_report, BetStats};
use crate::{settle_completed_weeks, settle_week, LeagueData};

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Balances and bets.
    pub ledger: Arc<Ledger<MemoryStore>>,
    /// Latest league data from the provider.
    pub league: Arc<RwLock<LeagueData>>,
    /// Session token keys.
    pub sessions: Arc<SessionKeys>,
    /// League data provider, used for settlement scores.
    pub client: Arc<SleeperClient>,
    /// User ids allowed to run settlement.
    pub admins: Arc<BTreeSet<String>>,
    /// Where the ledger snapshot is written after each change.
    pub ledger_path: Option<PathBuf>,
    persist_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(
        ledger: Ledger<MemoryStore>,
        league: LeagueData,
        sessions: SessionKeys,
        client: SleeperClient,
    ) -> Self {
        Self {
            ledger: Arc::new(ledger),
            league: Arc::new(RwLock::new(league)),
            sessions: Arc::new(sessions),
            client: Arc::new(client),
            admins: Arc::new(BTreeSet::new()),
            ledger_path: None,
            persist_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_ledger_path(mut self, path: PathBuf) -> Self {
        self.ledger_path = Some(path);
        self
    }

    pub fn with_admins<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.admins = Arc::new(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Write the ledger snapshot, if persistence is configured
    pub async fn persist(&self) -> crate::Result<()> {
        let Some(path) = &self.ledger_path else {
            return Ok(());
        };
        let _guard = self.persist_lock.lock().await;
        let snapshot = self.ledger.store().snapshot();
        save_snapshot(&snapshot, path).map_err(|e| {
            error!(path = %path.display(), error = %e, "Failed to save ledger snapshot");
            AppError::from(e)
        })
    }

    /// Settle finished weeks against the latest league data and save
    ///
    /// Nothing is graded while the league data is degraded.
    pub async fn settle_finished_weeks(&self) -> crate::Result<SettlementSummary> {
        let current_week = {
            let league = self.league.read().await;
            league.ensure_writable()?;
            league.current_week
        };
        let summary =
            settle_completed_weeks(&*self.client, &*self.ledger, current_week, Utc::now()).await;
        if summary.settled > 0 {
            self.persist().await?;
        }
        Ok(summary)
    }
}

/// Error body returned by API endpoints.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub error: String,
}

/// Maps library errors onto HTTP responses.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl From<WagerError> for ApiError {
    fn from(err: WagerError) -> Self {
        ApiError(err.into())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            AppError::Wager(WagerError::BettingClosed) => (StatusCode::LOCKED, "betting_closed"),
            AppError::Wager(WagerError::InsufficientBalance { .. }) => {
                (StatusCode::CONFLICT, "insufficient_balance")
            }
            AppError::Wager(_) => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_bet"),
            AppError::Auth(AuthError::Forbidden) => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::Auth(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::WeekNotFinished { .. } => (StatusCode::CONFLICT, "week_not_finished"),
            AppError::Upstream(_) => (StatusCode::BAD_GATEWAY, "upstream_unavailable"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }
        let body = ErrorBody {
            code,
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct WeekQuery {
    pub week: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct LinesResponse {
    pub week: u32,
    pub locked: bool,
    pub lines: Vec<BettingLine>,
}

#[derive(Debug, Deserialize)]
pub struct PlaceBetsRequest {
    pub bets: Vec<BetRequest>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SettleRequest {
    /// One week to settle; every finished week when absent
    #[serde(default)]
    pub week: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub user_id: String,
    pub balance: Decimal,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub bets: Vec<Bet>,
    pub stats: BetStats,
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Lines for a week (default: current week), priced from the latest data.
pub async fn get_lines(
    State(state): State<AppState>,
    Query(query): Query<WeekQuery>,
) -> impl IntoResponse {
    let league = state.league.read().await;
    let week = query.week.unwrap_or(league.current_week);
    let lines = league.lines_for_week(week);
    let locked = state.ledger.lock_window().is_locked(Utc::now());
    Json(LinesResponse {
        week,
        locked,
        lines,
    })
}

/// Place a batch of bets against the current week's lines.
pub async fn place_bets(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(request): Json<PlaceBetsRequest>,
) -> Result<Json<PlacementReceipt>, ApiError> {
    let offered = {
        let league = state.league.read().await;
        league.ensure_writable()?;
        league.lines_for_week(league.current_week)
    };
    // Lock is evaluated against the clock at submission time
    let receipt = state
        .ledger
        .place_bets(&user_id, &request.bets, &offered, Utc::now())
        .map_err(|e| {
            if let AppError::Wager(reason) = &e {
                warn!(%user_id, %reason, "Rejected bet batch");
            }
            e
        })?;
    state.persist().await?;
    Ok(Json(receipt))
}

/// Grade pending bets from final scores. Admin only.
pub async fn settle_bets(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(request): Json<SettleRequest>,
) -> Result<Json<SettlementSummary>, ApiError> {
    let summary = match request.week {
        None => state.settle_finished_weeks().await?,
        Some(week) => {
            let current_week = {
                let league = state.league.read().await;
                league.ensure_writable()?;
                league.current_week
            };
            if week >= current_week {
                return Err(AppError::WeekNotFinished { week, current_week }.into());
            }
            let summary = settle_week(&*state.client, &*state.ledger, week, Utc::now()).await?;
            state.persist().await?;
            summary
        }
    };
    info!(%admin, week = ?request.week, settled = summary.settled, "Settlement requested");
    Ok(Json(summary))
}

pub async fn get_balance(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> impl IntoResponse {
    let balance = state.ledger.balance(&user_id);
    Json(BalanceResponse { user_id, balance })
}

pub async fn get_bets(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> impl IntoResponse {
    let (bets, stats) = state.ledger.history(&user_id);
    Json(HistoryResponse { bets, stats })
}

/// FAAB adjustment report as CSV.
pub async fn faab_report_csv(State(state): State<AppState>) -> Result<Response, ApiError> {
    let rows = {
        let league = state.league.read().await;
        faab_report(&league.rosters, &league.users, &state.ledger.store().all_bets())
    };
    let mut body = Vec::new();
    write_faab_report(&rows, &mut body)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"faab_adjustments.csv\"",
            ),
        ],
        body,
    )
        .into_response())
}
