use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use faab_sportsbook::data::{load_snapshot, save_faab_report_to_csv};
use faab_sportsbook::ledger::{Ledger, SettlementSummary};
use faab_sportsbook::server::SessionKeys;
use faab_sportsbook::stats::{faab_report, standings};
use faab_sportsbook::store::{BetStore, MemoryStore};
use faab_sportsbook::{fetch_league_data, Config, SleeperClient};
use std::path::PathBuf;
use std::sync::Arc;

/// FAAB sportsbook - weekly lines and settlement for a Sleeper league.
#[derive(Parser, Debug)]
#[command(name = "faab-sportsbook")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the lines for a week (default: current week)
    Lines {
        #[arg(long)]
        week: Option<u32>,
    },

    /// Print league standings
    Standings,

    /// Ask the running server to settle; without --week, every finished week
    Settle {
        #[arg(long)]
        week: Option<u32>,

        /// Server base URL (default: http://BIND_ADDR)
        #[arg(long)]
        server: Option<String>,
    },

    /// Show a user's balance and betting record
    Balance { user_id: String },

    /// Write the FAAB adjustment report
    Report {
        #[arg(long, default_value = "faab_adjustments.csv")]
        out: PathBuf,
    },

    /// Issue a bearer token for a league user
    Token { user_id: String },
}

fn open_ledger(config: &Config) -> Result<Ledger<MemoryStore>> {
    let lock_window = config
        .lock_window()
        .map_err(|e| anyhow::anyhow!("Invalid lock window: {}", e))?;
    let snapshot = load_snapshot(&config.ledger_path)
        .with_context(|| format!("Failed to load ledger from {}", config.ledger_path.display()))?;
    Ok(Ledger::new(
        Arc::new(MemoryStore::from_snapshot(snapshot)),
        lock_window,
        config.starting_balance,
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::load().context("Failed to load configuration")?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    let client = SleeperClient::new(&config.sleeper_base_url, &config.league_id);

    match cli.command {
        Commands::Lines { week } => {
            let mut league = fetch_league_data(&client).await;
            let week = week.unwrap_or(league.current_week);
            if !league.matchups.contains_key(&week) {
                let matchups = client
                    .fetch_matchups(week)
                    .await
                    .with_context(|| format!("Failed to fetch week {} matchups", week))?;
                league.matchups.insert(week, matchups);
            }

            let lines = league.lines_for_week(week);
            println!("League {} - Week {}\n", league.league_id, week);
            if lines.is_empty() {
                println!("No matchups this week.");
            }
            for line in &lines {
                println!("  {}", line.format());
            }
            let locked = open_ledger(&config)?.lock_window().is_locked(Utc::now());
            println!("\nBetting is {}", if locked { "closed" } else { "open" });
        }

        Commands::Standings => {
            let league = fetch_league_data(&client).await;
            println!("League {} standings\n", league.league_id);
            for s in standings(&league.rosters, &league.users) {
                println!(
                    "{:>2}. {:<24} {}-{}-{}  {:.2} PF",
                    s.rank, s.team_name, s.wins, s.losses, s.ties, s.points_for
                );
            }
        }

        Commands::Settle { week, server } => {
            // The server owns the ledger file, so settlement goes through it
            let admin = config
                .admin_user_ids
                .first()
                .context("ADMIN_USER_IDS must name at least one admin to settle")?;
            let token = SessionKeys::new(&config.session_secret).issue(admin);
            let server = server.unwrap_or_else(|| format!("http://{}", config.bind_addr));
            let url = format!("{}/api/admin/settle", server.trim_end_matches('/'));

            let response = reqwest::Client::new()
                .post(&url)
                .bearer_auth(token)
                .json(&serde_json::json!({ "week": week }))
                .send()
                .await
                .with_context(|| format!("Failed to reach {}", url))?;
            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                anyhow::bail!("Settlement failed with {}: {}", status, body);
            }
            let summary: SettlementSummary = response
                .json()
                .await
                .context("Failed to parse settlement summary")?;

            println!(
                "Settled {} bets across {} matchups: {} won, {} lost, {} pushed, {} skipped",
                summary.settled,
                summary.matchups,
                summary.won,
                summary.lost,
                summary.pushed,
                summary.skipped
            );
            println!("Credited ${}", summary.credited);
        }

        Commands::Balance { user_id } => {
            let ledger = open_ledger(&config)?;
            let balance = ledger.balance(&user_id);
            let (bets, stats) = ledger.history(&user_id);
            println!("{}: ${} available\n", user_id, balance);
            println!(
                "  {} bets, {}W-{}L-{}P, {} pending (${})",
                stats.total_bets,
                stats.won_count,
                stats.lost_count,
                stats.push_count,
                stats.pending_count,
                stats.pending_stake
            );
            println!("  Net profit: ${}", stats.net_profit);
            for bet in bets.iter().take(10) {
                println!(
                    "  week {} {} {} {} ${} @ {:+} -> {:?}",
                    bet.week, bet.matchup_id, bet.bet_type, bet.selection, bet.stake, bet.odds, bet.status
                );
            }
        }

        Commands::Report { out } => {
            let league = fetch_league_data(&client).await;
            let ledger = open_ledger(&config)?;
            let rows = faab_report(&league.rosters, &league.users, &ledger.store().all_bets());
            save_faab_report_to_csv(&rows, &out)?;
            println!("Saved {} rows to {}", rows.len(), out.display());
        }

        Commands::Token { user_id } => {
            let keys = SessionKeys::new(&config.session_secret);
            println!("{}", keys.issue(&user_id));
        }
    }

    Ok(())
}
