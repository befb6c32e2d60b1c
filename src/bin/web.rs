use anyhow::{Context, Result};
use faab_sportsbook::server::{create_router, AppState, SessionKeys};
use faab_sportsbook::store::MemoryStore;
use faab_sportsbook::utils::data::load_snapshot;
use faab_sportsbook::utils::ledger::Ledger;
use faab_sportsbook::{fetch_league_data, Config, SleeperClient};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Pull fresh league data on a fixed interval and settle finished weeks
async fn refresh_loop(state: AppState, every: Duration) {
    let mut interval = tokio::time::interval(every);
    // First tick fires immediately; startup already loaded the data
    interval.tick().await;

    loop {
        interval.tick().await;

        let data = fetch_league_data(&state.client).await;
        if !state.league.write().await.refresh(data) {
            continue;
        }

        match state.settle_finished_weeks().await {
            Ok(summary) if summary.settled > 0 => info!(
                settled = summary.settled,
                credited = %summary.credited,
                "Settled finished weeks"
            ),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Settlement pass skipped"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load configuration")?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    let lock_window = config
        .lock_window()
        .map_err(|e| anyhow::anyhow!("Invalid lock window: {}", e))?;

    let snapshot = load_snapshot(&config.ledger_path)
        .with_context(|| format!("Failed to load ledger from {}", config.ledger_path.display()))?;
    info!(
        accounts = snapshot.balances.len(),
        bets = snapshot.bets.len(),
        path = %config.ledger_path.display(),
        "Loaded ledger"
    );
    let store = Arc::new(MemoryStore::from_snapshot(snapshot));
    let ledger = Ledger::new(store, lock_window, config.starting_balance);

    let client = SleeperClient::new(&config.sleeper_base_url, &config.league_id);
    let league = fetch_league_data(&client).await;
    if league.degraded {
        warn!(league_id = %config.league_id, "League data incomplete, wagers paused until the next good refresh");
    }
    if config.admin_user_ids.is_empty() {
        warn!("ADMIN_USER_IDS is empty, only automatic settlement will run");
    }

    let state = AppState::new(
        ledger,
        league,
        SessionKeys::new(&config.session_secret),
        client,
    )
    .with_ledger_path(config.ledger_path.clone())
    .with_admins(config.admin_user_ids.iter().cloned());

    tokio::spawn(refresh_loop(
        state.clone(),
        Duration::from_secs(config.refresh_secs),
    ));

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("Starting web server at http://{}", config.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
