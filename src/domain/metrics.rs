//! Observability counters for the click pipeline and the URL monitor.
//!
//! Counters are kept in-process as atomics so tests, the health endpoint and the
//! shutdown report can read them, and are mirrored to the [`metrics`] facade so an
//! exporter installed by the binary can scrape them. Nothing here is persisted.

use serde::Serialize;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the click pipeline (channel + worker pool).
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    accepted: AtomicU64,
    dropped: AtomicU64,
    rejected_closed: AtomicU64,
    processed: AtomicU64,
    failed: AtomicU64,
    abandoned: AtomicU64,
}

/// Point-in-time copy of [`PipelineMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineSnapshot {
    /// Events accepted into the channel.
    pub accepted: u64,
    /// Events rejected because the buffer was full.
    pub dropped: u64,
    /// Events rejected because the channel was already closed.
    pub rejected_closed: u64,
    /// Events whose click count was persisted.
    pub processed: u64,
    /// Events discarded after a persistence error.
    pub failed: u64,
    /// Accepted events left unfinished when the shutdown grace period elapsed.
    pub abandoned: u64,
}

impl PipelineSnapshot {
    /// Accepted events that have neither been persisted nor failed yet.
    pub fn outstanding(&self) -> u64 {
        self.accepted
            .saturating_sub(self.processed)
            .saturating_sub(self.failed)
    }
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("clicks_accepted_total").increment(1);
    }

    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("clicks_dropped_total").increment(1);
    }

    pub fn record_rejected_closed(&self) {
        self.rejected_closed.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("clicks_rejected_closed_total").increment(1);
    }

    pub fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("clicks_processed_total").increment(1);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("clicks_failed_total").increment(1);
    }

    pub fn record_abandoned(&self, count: u64) {
        if count == 0 {
            return;
        }
        self.abandoned.fetch_add(count, Ordering::Relaxed);
        metrics::counter!("clicks_abandoned_total").increment(count);
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        PipelineSnapshot {
            accepted: self.accepted.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            rejected_closed: self.rejected_closed.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
        }
    }
}

/// Outcome of a single monitor tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// Links whose probe ran to completion (success, failure or timeout).
    pub probed: usize,
    /// Probes that found the target reachable.
    pub healthy: usize,
    /// Probes that failed or timed out.
    pub unhealthy: usize,
    /// Health updates the repository refused.
    pub update_failures: usize,
    /// Links skipped because cancellation arrived before their probe started.
    pub skipped: usize,
}

/// Counters for the URL monitor.
#[derive(Debug, Default)]
pub struct MonitorMetrics {
    ticks: AtomicU64,
    probe_successes: AtomicU64,
    probe_failures: AtomicU64,
    update_failures: AtomicU64,
    last_tick: Mutex<Option<TickReport>>,
}

/// Point-in-time copy of [`MonitorMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MonitorSnapshot {
    pub ticks: u64,
    pub probe_successes: u64,
    pub probe_failures: u64,
    pub update_failures: u64,
    pub last_tick: Option<TickReport>,
}

impl MonitorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a finished tick into the cumulative counters.
    pub fn record_tick(&self, report: TickReport) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        self.probe_successes
            .fetch_add(report.healthy as u64, Ordering::Relaxed);
        self.probe_failures
            .fetch_add(report.unhealthy as u64, Ordering::Relaxed);
        self.update_failures
            .fetch_add(report.update_failures as u64, Ordering::Relaxed);

        metrics::counter!("monitor_ticks_total").increment(1);
        metrics::counter!("monitor_probes_total", "result" => "healthy")
            .increment(report.healthy as u64);
        metrics::counter!("monitor_probes_total", "result" => "unhealthy")
            .increment(report.unhealthy as u64);

        if let Ok(mut last) = self.last_tick.lock() {
            *last = Some(report);
        }
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        MonitorSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            probe_successes: self.probe_successes.load(Ordering::Relaxed),
            probe_failures: self.probe_failures.load(Ordering::Relaxed),
            update_failures: self.update_failures.load(Ordering::Relaxed),
            last_tick: self.last_tick.lock().ok().and_then(|last| *last),
        }
    }
}
