//! Start/stop ordering of the click pipeline, the URL monitor and the HTTP listener.
//!
//! # Startup
//!
//! ```text
//! click channel ─► worker pool ─► URL monitor ─► (caller binds listener) ─► serve
//! ```
//!
//! # Shutdown
//!
//! ```text
//! listener stops accepting ─► in-flight requests (bounded)
//!   ─► click channel closed ─► workers drain (bounded) ─► monitor cancelled (bounded)
//! ```
//!
//! Every wait is bounded and followed by task abortion, so a hung worker, probe
//! or connection never keeps the process alive. The outcome of each step is
//! collected in a [`ShutdownReport`].

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::{Router, ServiceExt};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tower::Layer;
use tower_http::normalize_path::NormalizePath;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::domain::click_channel::ClickChannel;
use crate::domain::click_worker::{ClickWorkerPool, DrainOutcome};
use crate::domain::metrics::{MonitorMetrics, MonitorSnapshot, PipelineMetrics, PipelineSnapshot};
use crate::domain::prober::UrlProber;
use crate::domain::repositories::{ClickRepository, LinkRepository};
use crate::domain::url_monitor::{
    MonitorHandle, MonitorSettings, MonitorState, MonitorStopOutcome, UrlMonitor,
};

/// Sizes and time budgets of the background components.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleSettings {
    pub click_buffer_size: usize,
    pub click_worker_count: usize,
    pub monitor: MonitorSettings,
    /// Budget for the worker drain, and separately for the monitor stop.
    pub shutdown_grace: Duration,
    /// Budget for in-flight requests after the listener stops accepting.
    pub http_shutdown_timeout: Duration,
}

impl LifecycleSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            click_buffer_size: config.click_buffer_size,
            click_worker_count: config.click_worker_count,
            monitor: config.monitor_settings(),
            shutdown_grace: config.shutdown_grace(),
            http_shutdown_timeout: config.http_shutdown_timeout(),
        }
    }
}

/// Outcome of stopping the HTTP listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HttpStopOutcome {
    /// All connections finished within the timeout.
    Completed,
    /// Requests were still running when the timeout elapsed; they were
    /// cancelled and answered with 503.
    TimedOut,
    /// The server stopped with an error before or during shutdown.
    Failed,
    /// No listener was served by this lifecycle.
    NotStarted,
}

impl HttpStopOutcome {
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Completed | Self::NotStarted)
    }
}

/// Per-step outcome of a shutdown plus the final counters.
#[derive(Debug, Clone, Serialize)]
pub struct ShutdownReport {
    pub http: HttpStopOutcome,
    pub workers: DrainOutcome,
    pub monitor: MonitorStopOutcome,
    pub pipeline: PipelineSnapshot,
    pub monitor_metrics: MonitorSnapshot,
}

impl ShutdownReport {
    /// True when no step was forced or failed.
    pub fn is_clean(&self) -> bool {
        self.http.is_clean() && self.workers.is_clean() && self.monitor.is_clean()
    }
}

/// The running background components of the service.
///
/// Owns the only [`ClickChannel`]; request handlers receive it through
/// [`Lifecycle::click_channel`].
pub struct Lifecycle {
    channel: Arc<ClickChannel>,
    pool: ClickWorkerPool,
    monitor: MonitorHandle,
    pipeline_metrics: Arc<PipelineMetrics>,
    settings: LifecycleSettings,
}

impl Lifecycle {
    /// Starts the click channel, the worker pool and the URL monitor, in that order.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(
        settings: LifecycleSettings,
        links: Arc<dyn LinkRepository>,
        clicks: Arc<dyn ClickRepository>,
        prober: Arc<dyn UrlProber>,
    ) -> Self {
        let pipeline_metrics = Arc::new(PipelineMetrics::new());
        let (channel, receiver) =
            ClickChannel::new(settings.click_buffer_size, pipeline_metrics.clone());
        info!(capacity = channel.capacity(), "Click channel ready");

        let pool = ClickWorkerPool::start(
            receiver,
            clicks,
            settings.click_worker_count,
            pipeline_metrics.clone(),
        );

        let monitor = UrlMonitor::new(
            links,
            prober,
            settings.monitor,
            Arc::new(MonitorMetrics::new()),
        )
        .start();

        Self {
            channel: Arc::new(channel),
            pool,
            monitor,
            pipeline_metrics,
            settings,
        }
    }

    pub fn click_channel(&self) -> Arc<ClickChannel> {
        self.channel.clone()
    }

    pub fn pipeline_metrics(&self) -> Arc<PipelineMetrics> {
        self.pipeline_metrics.clone()
    }

    pub fn monitor_metrics(&self) -> Arc<MonitorMetrics> {
        self.monitor.metrics().clone()
    }

    pub fn monitor_state(&self) -> watch::Receiver<MonitorState> {
        self.monitor.subscribe()
    }

    pub fn settings(&self) -> &LifecycleSettings {
        &self.settings
    }

    /// Serves `app` on `listener` until `signal` resolves, then shuts everything down.
    ///
    /// Once the signal fires the listener stops accepting connections and
    /// in-flight requests get `http_shutdown_timeout` to finish. Requests still
    /// running after that are cancelled and answered with 503, so none of them
    /// outlives this call. The background components are stopped afterwards, so
    /// a request that finishes in time can still enqueue its click.
    pub async fn serve<F>(
        self,
        listener: TcpListener,
        app: NormalizePath<Router>,
        signal: F,
    ) -> ShutdownReport
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let stop_accepting = CancellationToken::new();
        let cancel_requests = CancellationToken::new();
        let app = middleware::from_fn_with_state(cancel_requests.clone(), cancel_on_forced_stop)
            .layer(app);
        let server = axum::serve(
            listener,
            ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
        )
        .with_graceful_shutdown(stop_accepting.clone().cancelled_owned());

        let mut server_task = tokio::spawn(async move { server.await });

        let exited_early = tokio::select! {
            _ = signal => {
                info!("Shutdown signal received");
                None
            }
            result = &mut server_task => Some(result),
        };

        stop_accepting.cancel();

        let http = match exited_early {
            Some(result) => {
                error!(?result, "HTTP server stopped before the shutdown signal");
                HttpStopOutcome::Failed
            }
            None => match timeout(self.settings.http_shutdown_timeout, &mut server_task).await {
                Ok(Ok(Ok(()))) => {
                    info!("HTTP server stopped");
                    HttpStopOutcome::Completed
                }
                Ok(Ok(Err(e))) => {
                    error!(error = %e, "HTTP server failed during shutdown");
                    HttpStopOutcome::Failed
                }
                Ok(Err(e)) => {
                    error!(error = %e, "HTTP server task failed");
                    HttpStopOutcome::Failed
                }
                Err(_) => {
                    cancel_requests.cancel();
                    server_task.abort();
                    warn!(
                        timeout_ms = self.settings.http_shutdown_timeout.as_millis() as u64,
                        "In-flight requests did not finish in time, cancelling them"
                    );
                    HttpStopOutcome::TimedOut
                }
            },
        };

        self.stop_background(http).await
    }

    /// Stops the background components without a listener.
    pub async fn shutdown(self) -> ShutdownReport {
        self.stop_background(HttpStopOutcome::NotStarted).await
    }

    async fn stop_background(self, http: HttpStopOutcome) -> ShutdownReport {
        let grace = self.settings.shutdown_grace;

        self.channel.close();
        let workers = self.pool.shutdown(grace).await;

        let monitor_metrics = self.monitor.metrics().clone();
        let monitor = self.monitor.stop(grace).await;

        let report = ShutdownReport {
            http,
            workers,
            monitor,
            pipeline: self.pipeline_metrics.snapshot(),
            monitor_metrics: monitor_metrics.snapshot(),
        };

        if report.is_clean() {
            info!(
                processed = report.pipeline.processed,
                failed = report.pipeline.failed,
                dropped = report.pipeline.dropped,
                "Shutdown complete"
            );
        } else {
            warn!(
                http = ?report.http,
                workers = ?report.workers,
                monitor = ?report.monitor,
                abandoned = report.pipeline.abandoned,
                "Shutdown forced"
            );
        }

        report
    }
}

/// Runs the request unless `cancel` fires first, in which case the handler is
/// dropped and the client gets 503.
async fn cancel_on_forced_stop(
    State(cancel): State<CancellationToken>,
    request: Request,
    next: Next,
) -> Response {
    tokio::select! {
        response = next.run(request) => response,
        _ = cancel.cancelled() => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}

/// Resolves on Ctrl+C, or on SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
