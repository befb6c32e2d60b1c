//! HTTP API route definitions.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::handlers::{
    faab_report_csv, get_balance, get_bets, get_lines, health, place_bets, settle_bets, AppState,
};
use super::pages::home;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/api/lines", get(get_lines))
        .route("/api/bets", get(get_bets).post(place_bets))
        .route("/api/balance", get(get_balance))
        .route("/api/reports/faab.csv", get(faab_report_csv))
        .route("/api/admin/settle", post(settle_bets))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LeagueUser, Matchup, MatchupSide, TeamRecord};
    use crate::server::SessionKeys;
    use crate::api::SleeperClient;
    use crate::store::MemoryStore;
    use crate::utils::ledger::Ledger;
    use crate::utils::lock_window::LockWindow;
    use crate::{LeagueData, WeekSource};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::Json;
    use chrono::{NaiveTime, Weekday};
    use rust_decimal::Decimal;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    const SECRET: &str = "router-test-secret";

    fn league() -> LeagueData {
        let mut data = LeagueData::empty("lg");
        data.current_week = 4;
        data.week_source = WeekSource::Provider;
        data.degraded = false;
        data.users = vec![LeagueUser {
            user_id: "u1".to_string(),
            display_name: "alice".to_string(),
            team_name: Some("Alpha".to_string()),
        }];
        data.rosters = vec![
            TeamRecord {
                roster_id: 1,
                owner_id: Some("u1".to_string()),
                wins: 3,
                points_for: 360.0,
                points_against: 300.0,
                ..Default::default()
            },
            TeamRecord {
                roster_id: 2,
                owner_id: None,
                losses: 3,
                points_for: 300.0,
                points_against: 360.0,
                ..Default::default()
            },
        ];
        data.matchups.insert(
            4,
            vec![Matchup {
                league_id: "lg".to_string(),
                week: 4,
                matchup_number: 1,
                team_a: MatchupSide {
                    roster_id: 1,
                    points: 0.0,
                },
                team_b: MatchupSide {
                    roster_id: 2,
                    points: 0.0,
                },
            }],
        );
        data
    }

    /// A window that never locks: lock instant is past the end of Sunday
    fn always_open() -> LockWindow {
        LockWindow::new(
            chrono_tz::UTC,
            Weekday::Sun,
            NaiveTime::from_hms_opt(23, 59, 59).unwrap(),
        )
    }

    /// A window locked from Monday 00:00 onward
    fn always_locked() -> LockWindow {
        LockWindow::new(chrono_tz::UTC, Weekday::Mon, NaiveTime::MIN)
    }

    fn state_with(window: LockWindow, client: SleeperClient) -> AppState {
        let ledger = Ledger::new(Arc::new(MemoryStore::new()), window, Decimal::ONE_HUNDRED);
        AppState::new(ledger, league(), SessionKeys::new(SECRET), client).with_admins(["commish"])
    }

    fn app(window: LockWindow) -> (Router, AppState) {
        let state = state_with(window, SleeperClient::new("http://127.0.0.1:9", "lg"));
        (create_router(state.clone()), state)
    }

    /// Serve week 4 final scores on a local port
    async fn sleeper_with_scores(a: f64, b: f64) -> SleeperClient {
        let scores = serde_json::json!([
            {"roster_id": 1, "matchup_id": 1, "points": a},
            {"roster_id": 2, "matchup_id": 1, "points": b}
        ]);
        let router = Router::new().route(
            "/league/lg/matchups/4",
            get(move || {
                let scores = scores.clone();
                async move { Json(scores) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        SleeperClient::new(format!("http://{}", addr), "lg")
    }

    fn post_settle(user_id: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/admin/settle")
            .header(header::AUTHORIZATION, bearer(user_id))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn moneyline_bet(stake: u32) -> Value {
        json!({"bets": [
            {"matchup_id": "lg:4:1", "bet_type": "moneyline", "selection": {"roster": 1}, "stake": stake}
        ]})
    }

    fn bearer(user_id: &str) -> String {
        format!("Bearer {}", SessionKeys::new(SECRET).issue(user_id))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_bets(user_id: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/bets")
            .header(header::AUTHORIZATION, bearer(user_id))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint_returns_ok() {
        let (app, _) = app(always_open());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_lines_default_to_current_week() {
        let (app, _) = app(always_open());
        let response = app
            .oneshot(Request::builder().uri("/api/lines").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["week"], 4);
        assert_eq!(body["locked"], false);
        assert_eq!(body["lines"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_lines_for_week_without_matchups_is_empty() {
        let (app, _) = app(always_open());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/lines?week=9")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["lines"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_balance_requires_token() {
        let (app, _) = app(always_open());
        let response = app
            .oneshot(Request::builder().uri("/api/balance").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_place_bets_and_read_back() {
        let (app, state) = app(always_open());
        let response = app
            .clone()
            .oneshot(post_bets(
                "u1",
                json!({"bets": [
                    {"matchup_id": "lg:4:1", "bet_type": "moneyline", "selection": {"roster": 2}, "stake": "25"},
                    {"matchup_id": "lg:4:1", "bet_type": "total", "selection": "over", "stake": 10}
                ]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let receipt = body_json(response).await;
        assert_eq!(receipt["requested"], 2);
        assert_eq!(receipt["placed"], 2);
        assert_eq!(receipt["balance"], "65");
        assert_eq!(state.ledger.balance("u1"), Decimal::new(65, 0));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/bets")
                    .header(header::AUTHORIZATION, bearer("u1"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let history = body_json(response).await;
        assert_eq!(history["bets"].as_array().unwrap().len(), 2);
        assert_eq!(history["stats"]["pending_count"], 2);
    }

    #[tokio::test]
    async fn test_overdrawn_batch_is_conflict() {
        let (app, state) = app(always_open());
        let response = app
            .oneshot(post_bets(
                "u1",
                json!({"bets": [
                    {"matchup_id": "lg:4:1", "bet_type": "moneyline", "selection": {"roster": 1}, "stake": 30},
                    {"matchup_id": "lg:4:1", "bet_type": "moneyline", "selection": {"roster": 2}, "stake": 80}
                ]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(response).await["code"], "insufficient_balance");
        assert_eq!(state.ledger.balance("u1"), Decimal::ONE_HUNDRED);
    }

    #[tokio::test]
    async fn test_locked_window_is_423() {
        let (app, _) = app(always_locked());
        let response = app
            .oneshot(post_bets(
                "u1",
                json!({"bets": [
                    {"matchup_id": "lg:4:1", "bet_type": "spread", "selection": {"roster": 1}, "stake": 5}
                ]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::LOCKED);
        assert_eq!(body_json(response).await["code"], "betting_closed");
    }

    #[tokio::test]
    async fn test_malformed_bet_is_unprocessable() {
        let (app, _) = app(always_open());
        let response = app
            .oneshot(post_bets(
                "u1",
                json!({"bets": [
                    {"matchup_id": "lg:4:1", "bet_type": "spread", "selection": "over", "stake": 5}
                ]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_faab_report_is_csv() {
        let (app, _) = app(always_open());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/reports/faab.csv")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/csv; charset=utf-8"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Roster ID,Team Name,Owner Name,FAAB Adjustment,Notes")
        );
        assert_eq!(lines.next(), Some("1,Alpha,alice,0,\"0W-0L-0P, 0 pending\""));
        assert_eq!(lines.next(), Some("2,Team 2,Unowned,0,\"0W-0L-0P, 0 pending\""));
    }

    #[tokio::test]
    async fn test_home_page_renders() {
        let (app, _) = app(always_open());
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Week 4"));
        assert!(html.contains("Alpha"));
    }

    #[tokio::test]
    async fn test_bets_refused_while_league_data_degraded() {
        let (app, state) = app(always_open());
        {
            let mut league = state.league.write().await;
            league.current_week = 1;
            league.week_source = WeekSource::Fallback;
        }
        let response = app.oneshot(post_bets("u1", moneyline_bet(20))).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(response).await["code"], "upstream_unavailable");
        assert_eq!(state.ledger.balance("u1"), Decimal::ONE_HUNDRED);
    }

    #[tokio::test]
    async fn test_unsaved_bets_are_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "a file, not a directory").unwrap();
        let state = state_with(always_open(), SleeperClient::new("http://127.0.0.1:9", "lg"))
            .with_ledger_path(blocker.join("ledger.json"));
        let app = create_router(state);

        let response = app.oneshot(post_bets("u1", moneyline_bet(20))).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_settle_requires_admin() {
        let (app, _) = app(always_open());
        let response = app.oneshot(post_settle("u1", json!({}))).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_settle_refuses_unfinished_week() {
        let (app, _) = app(always_open());
        let response = app
            .oneshot(post_settle("commish", json!({"week": 4})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(response).await["code"], "week_not_finished");
    }

    #[tokio::test]
    async fn test_admin_settles_finished_week_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let client = sleeper_with_scores(131.5, 97.25).await;
        let state = state_with(always_open(), client).with_ledger_path(path.clone());
        let app = create_router(state.clone());

        let response = app
            .clone()
            .oneshot(post_bets("u1", moneyline_bet(20)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Provider moves on to week 5
        state.league.write().await.current_week = 5;

        let response = app
            .clone()
            .oneshot(post_settle("commish", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let summary = body_json(response).await;
        assert_eq!(summary["settled"], 1);
        assert_eq!(summary["won"], 1);
        let settled_balance = state.ledger.balance("u1");
        assert!(settled_balance > Decimal::ONE_HUNDRED);

        let response = app
            .oneshot(post_settle("commish", json!({"week": 4})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["settled"], 0);
        assert_eq!(state.ledger.balance("u1"), settled_balance);

        let snapshot = crate::utils::data::load_snapshot(&path).unwrap();
        assert_eq!(snapshot.balances.get("u1"), Some(&settled_balance));
    }
}
