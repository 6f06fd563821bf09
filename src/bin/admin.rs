//! CLI administration tool for url-shortener.
//!
//! Reads statistics and runs maintenance tasks directly against the database,
//! without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Click total and health of one link
//! cargo run --bin admin -- stats --code Xa3_k9Qz
//!
//! # Totals over all links
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//!
//! # Probe every link once and store the results
//! cargo run --bin admin -- monitor check-once
//! ```
//!
//! # Environment Variables
//!
//! Same as the server (`DATABASE_URL` or `DB_*`, `MONITOR_*`); see
//! `url_shortener::config`.

use url_shortener::application::services::LinkService;
use url_shortener::config::{self, Config};
use url_shortener::domain::metrics::{MonitorMetrics, TickReport};
use url_shortener::domain::url_monitor::UrlMonitor;
use url_shortener::infrastructure::HttpProber;
use url_shortener::infrastructure::persistence::{PgClickRepository, PgLinkRepository};
use url_shortener::server::connect_pool;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing url-shortener.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Show statistics for one link, or totals over all links
    Stats {
        /// Short code of the link
        #[arg(short, long)]
        code: Option<String>,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },

    /// URL monitor operations
    Monitor {
        #[command(subcommand)]
        action: MonitorAction,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[derive(Subcommand)]
enum MonitorAction {
    /// Run a single health check tick over all links
    CheckOnce,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = config::load_from_env()?;
    let pool = connect_pool(&config).await?;

    match cli.command {
        Commands::Stats { code: Some(code) } => handle_link_stats(&config, &pool, &code).await?,
        Commands::Stats { code: None } => handle_totals(&pool).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
        Commands::Monitor {
            action: MonitorAction::CheckOnce,
        } => handle_check_once(&config, &pool).await?,
    }

    Ok(())
}

/// Prints short code, long URL, total clicks and health of one link.
async fn handle_link_stats(config: &Config, pool: &PgPool, code: &str) -> Result<()> {
    let pool = Arc::new(pool.clone());
    let service = LinkService::new(
        Arc::new(PgLinkRepository::new(pool.clone())),
        Arc::new(PgClickRepository::new(pool)),
        config.base_url.as_str(),
    );

    let stats = service.get_link_stats(code).await?;

    println!("{}", "📊 Link statistics".bright_blue().bold());
    println!();
    println!("  Short code:   {}", stats.link.code.bright_white().bold());
    println!("  Short URL:    {}", service.short_url(&stats.link.code));
    println!("  Long URL:     {}", stats.link.long_url);
    println!(
        "  Total clicks: {}",
        stats.total_clicks.to_string().bright_green().bold()
    );

    let health = if stats.link.healthy {
        "healthy".green().bold()
    } else {
        "unreachable".red().bold()
    };
    match stats.last_checked_at() {
        Some(checked_at) => println!("  Health:       {} (checked {})", health, checked_at),
        None => println!("  Health:       {} (never checked)", health),
    }
    println!();

    Ok(())
}

async fn handle_totals(pool: &PgPool) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let (links, clicks, unhealthy): (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*),
               COALESCE(SUM(click_count), 0)::BIGINT,
               COUNT(*) FILTER (WHERE NOT healthy)
        FROM links
        "#,
    )
    .fetch_one(pool)
    .await?;

    println!("  Links:     {}", links.to_string().bright_green().bold());
    println!("  Clicks:    {}", clicks.to_string().bright_green().bold());
    println!("  Unhealthy: {}", unhealthy.to_string().bright_red().bold());
    println!();

    Ok(())
}

/// Dispatches database commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            println!("  PostgreSQL: {}", version.bright_white());
            println!();
        }
    }

    Ok(())
}

/// Probes every stored link once with the configured monitor settings.
async fn handle_check_once(config: &Config, pool: &PgPool) -> Result<()> {
    let settings = config.monitor_settings();
    let pool = Arc::new(pool.clone());

    let monitor = UrlMonitor::new(
        Arc::new(PgLinkRepository::new(pool)),
        Arc::new(HttpProber::new(settings.probe_timeout)?),
        settings,
        Arc::new(MonitorMetrics::new()),
    );

    println!("{}", "🔍 Probing all links...".bright_blue());

    let report = monitor.run_tick().await?;
    print_tick_report(&report);

    Ok(())
}

fn print_tick_report(report: &TickReport) {
    println!();
    println!("  Probed:          {}", report.probed.to_string().bold());
    println!(
        "  Healthy:         {}",
        report.healthy.to_string().bright_green().bold()
    );
    println!(
        "  Unhealthy:       {}",
        report.unhealthy.to_string().bright_red().bold()
    );
    if report.update_failures > 0 {
        println!(
            "  Update failures: {}",
            report.update_failures.to_string().yellow().bold()
        );
    }
    println!();
}
