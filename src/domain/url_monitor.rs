//! Background monitor that periodically probes every stored link.
//!
//! Each tick takes a snapshot of the links, probes them with a bounded number of
//! concurrent probes, each under its own deadline, and writes the resulting health
//! flag back through [`LinkRepository::update_health`]. Failures of individual
//! probes or updates are logged and counted; they never stop the monitor.
//!
//! # Lifecycle
//!
//! ```text
//! Idle ──start()──► Running ──stop()──► Cancelling ──probes done──► Stopped
//! ```

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Semaphore, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior, interval_at, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::domain::entities::Link;
use crate::domain::metrics::{MonitorMetrics, TickReport};
use crate::domain::prober::UrlProber;
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

/// Observable state of the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorState {
    Idle,
    Running,
    Cancelling,
    Stopped,
}

/// How a monitor stop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorStopOutcome {
    /// All in-flight probes finished (or timed out) before the grace period.
    Stopped,
    /// The grace period elapsed, or the monitor task died; the task was aborted.
    Forced,
}

impl MonitorStopOutcome {
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}

/// Timing and concurrency limits of the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    pub interval: Duration,
    pub probe_timeout: Duration,
    pub max_concurrent_probes: usize,
}

impl MonitorSettings {
    /// Builds settings, enforcing `probe_timeout < interval` and at least one
    /// probe slot.
    ///
    /// A probe timeout that is not strictly shorter than the interval is
    /// replaced by half the interval.
    pub fn new(interval: Duration, probe_timeout: Duration, max_concurrent_probes: usize) -> Self {
        let interval = interval.max(Duration::from_millis(1));
        let probe_timeout = if probe_timeout.is_zero() || probe_timeout >= interval {
            interval / 2
        } else {
            probe_timeout
        };

        Self {
            interval,
            probe_timeout,
            max_concurrent_probes: max_concurrent_probes.max(1),
        }
    }
}

/// Periodic reachability checker for stored links.
pub struct UrlMonitor {
    links: Arc<dyn LinkRepository>,
    prober: Arc<dyn UrlProber>,
    settings: MonitorSettings,
    metrics: Arc<MonitorMetrics>,
    state: Arc<watch::Sender<MonitorState>>,
}

struct ProbeRecord {
    healthy: bool,
    updated: bool,
}

impl UrlMonitor {
    pub fn new(
        links: Arc<dyn LinkRepository>,
        prober: Arc<dyn UrlProber>,
        settings: MonitorSettings,
        metrics: Arc<MonitorMetrics>,
    ) -> Self {
        let (state, _) = watch::channel(MonitorState::Idle);
        Self {
            links,
            prober,
            settings,
            metrics,
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> MonitorState {
        *self.state.borrow()
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// Runs one full tick immediately and returns its report.
    ///
    /// # Errors
    ///
    /// Returns the repository error if the link list cannot be fetched. Probe
    /// and update failures are part of the report, not errors.
    pub async fn run_tick(&self) -> Result<TickReport, AppError> {
        self.run_tick_until(&CancellationToken::new()).await
    }

    /// Spawns the periodic loop. The first tick fires one interval after start.
    pub fn start(self) -> MonitorHandle {
        let cancel = CancellationToken::new();
        let state = self.state.clone();
        let metrics = self.metrics.clone();

        state.send_replace(MonitorState::Running);
        let task = tokio::spawn(self.run(cancel.clone()));

        MonitorHandle {
            cancel,
            task,
            state,
            metrics,
        }
    }

    async fn run(self, cancel: CancellationToken) {
        let _stopped = StoppedOnDrop(self.state.clone());

        info!(
            interval_secs = self.settings.interval.as_secs(),
            probe_timeout_ms = self.settings.probe_timeout.as_millis() as u64,
            max_concurrent_probes = self.settings.max_concurrent_probes,
            "URL monitor started"
        );

        let mut ticker = interval_at(
            Instant::now() + self.settings.interval,
            self.settings.interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    match self.run_tick_until(&cancel).await {
                        Ok(report) => info!(
                            probed = report.probed,
                            healthy = report.healthy,
                            unhealthy = report.unhealthy,
                            update_failures = report.update_failures,
                            skipped = report.skipped,
                            "URL monitor tick finished"
                        ),
                        Err(e) => error!(error = %e, "URL monitor could not list links"),
                    }
                }
            }
        }

        info!("URL monitor stopped");
    }

    async fn run_tick_until(&self, cancel: &CancellationToken) -> Result<TickReport, AppError> {
        let links = self.links.list_all().await?;
        let total = links.len();
        debug!(links = total, "Probing links");

        let slots = Arc::new(Semaphore::new(self.settings.max_concurrent_probes));
        let mut probes = JoinSet::new();
        let mut report = TickReport::default();

        for (index, link) in links.into_iter().enumerate() {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                permit = slots.clone().acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                report.skipped = total - index;
                break;
            };

            let links = self.links.clone();
            let prober = self.prober.clone();
            let probe_timeout = self.settings.probe_timeout;
            probes.spawn(async move {
                let record = probe_link(links, prober, link, probe_timeout).await;
                drop(permit);
                record
            });
        }

        while let Some(result) = probes.join_next().await {
            match result {
                Ok(record) => {
                    report.probed += 1;
                    if record.healthy {
                        report.healthy += 1;
                    } else {
                        report.unhealthy += 1;
                    }
                    if !record.updated {
                        report.update_failures += 1;
                    }
                }
                Err(e) => {
                    error!(error = %e, "Probe task failed");
                    report.update_failures += 1;
                }
            }
        }

        self.metrics.record_tick(report);
        Ok(report)
    }
}

/// Publishes [`MonitorState::Stopped`] when the monitor task ends, including
/// by panic or abortion.
struct StoppedOnDrop(Arc<watch::Sender<MonitorState>>);

impl Drop for StoppedOnDrop {
    fn drop(&mut self) {
        self.0.send_replace(MonitorState::Stopped);
    }
}

async fn probe_link(
    links: Arc<dyn LinkRepository>,
    prober: Arc<dyn UrlProber>,
    link: Link,
    probe_timeout: Duration,
) -> ProbeRecord {
    let healthy = match timeout(probe_timeout, prober.probe(&link.long_url)).await {
        Ok(Ok(outcome)) => {
            if !outcome.reachable {
                debug!(link_id = link.id, status = ?outcome.status, "Link responded with an error status");
            }
            outcome.reachable
        }
        Ok(Err(e)) => {
            debug!(link_id = link.id, url = %link.long_url, error = %e, "Probe failed");
            false
        }
        Err(_) => {
            debug!(
                link_id = link.id,
                url = %link.long_url,
                timeout_ms = probe_timeout.as_millis() as u64,
                "Probe timed out"
            );
            false
        }
    };

    if link.healthy != healthy {
        info!(link_id = link.id, code = %link.code, healthy, "Link health changed");
    }

    let updated = match links.update_health(link.id, healthy, Utc::now()).await {
        Ok(()) => true,
        Err(e) => {
            warn!(link_id = link.id, error = %e, "Failed to store link health");
            false
        }
    };

    ProbeRecord { healthy, updated }
}

/// Handle to a running [`UrlMonitor`].
pub struct MonitorHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    state: Arc<watch::Sender<MonitorState>>,
    metrics: Arc<MonitorMetrics>,
}

impl MonitorHandle {
    pub fn state(&self) -> MonitorState {
        *self.state.borrow()
    }

    /// Subscribes to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<MonitorState> {
        self.state.subscribe()
    }

    pub fn metrics(&self) -> &Arc<MonitorMetrics> {
        &self.metrics
    }

    /// Cancels the monitor and waits up to `grace` for in-flight probes.
    ///
    /// No new tick and no new probe starts after this call. If the grace period
    /// elapses first, the monitor task and its probe tasks are aborted.
    pub async fn stop(self, grace: Duration) -> MonitorStopOutcome {
        self.state.send_if_modified(|state| {
            if *state == MonitorState::Running {
                *state = MonitorState::Cancelling;
                true
            } else {
                false
            }
        });
        self.cancel.cancel();

        let mut task = self.task;
        match timeout(grace, &mut task).await {
            Ok(Ok(())) => MonitorStopOutcome::Stopped,
            Ok(Err(e)) => {
                error!(error = %e, "URL monitor task failed");
                self.state.send_replace(MonitorState::Stopped);
                MonitorStopOutcome::Forced
            }
            Err(_) => {
                task.abort();
                let _ = task.await;
                self.state.send_replace(MonitorState::Stopped);
                warn!(
                    grace_ms = grace.as_millis() as u64,
                    "URL monitor did not stop within the grace period, probes aborted"
                );
                MonitorStopOutcome::Forced
            }
        }
    }
}
