//! HTTP server initialization and runtime setup.
//!
//! Wires the database, the repositories, the background components and the Axum
//! listener together, then runs until a shutdown signal arrives.

use crate::config::Config;
use crate::domain::prober::UrlProber;
use crate::domain::repositories::{ClickRepository, LinkRepository};
use crate::infrastructure::HttpProber;
use crate::infrastructure::persistence::{PgClickRepository, PgLinkRepository};
use crate::lifecycle::{Lifecycle, LifecycleSettings, ShutdownReport, shutdown_signal};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Opens the connection pool described by `config`.
pub async fn connect_pool(config: &Config) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")
}

/// Runs the service with the given configuration.
///
/// Startup order, each step fatal on failure:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Repositories and URL prober
/// - Click channel, worker pool and URL monitor
/// - Listener bound on `config.listen_addr`
///
/// Returns the shutdown report once the process was asked to stop.
///
/// # Errors
///
/// Returns an error if any startup step fails. Problems during shutdown are
/// part of the report instead.
pub async fn run(config: Config) -> Result<ShutdownReport> {
    let pool = connect_pool(&config).await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    let pool = Arc::new(pool);
    let links: Arc<dyn LinkRepository> = Arc::new(PgLinkRepository::new(pool.clone()));
    let clicks: Arc<dyn ClickRepository> = Arc::new(PgClickRepository::new(pool.clone()));

    let settings = LifecycleSettings::from_config(&config);
    let prober: Arc<dyn UrlProber> = Arc::new(
        HttpProber::new(settings.monitor.probe_timeout)
            .context("Failed to build HTTP client for the URL monitor")?,
    );

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", config.listen_addr))?;

    let lifecycle = Lifecycle::start(settings, links.clone(), clicks.clone(), prober);

    let state = AppState::new(
        links,
        clicks,
        lifecycle.click_channel(),
        lifecycle.monitor_state(),
        &config.base_url,
    );
    let app = app_router(state);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            lifecycle.shutdown().await;
            return Err(e).with_context(|| format!("Failed to bind {addr}"));
        }
    };
    tracing::info!("Listening on http://{addr}");

    Ok(lifecycle.serve(listener, app, shutdown_signal()).await)
}
