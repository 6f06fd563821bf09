//! Worker pool that turns queued click events into persisted click counts.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::domain::click_channel::ClickReceiver;
use crate::domain::metrics::PipelineMetrics;
use crate::domain::repositories::ClickRepository;

/// How a pool shutdown ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DrainOutcome {
    /// Every accepted event was persisted or failed before the grace period ran out.
    Drained,
    /// The grace period elapsed; `count` accepted events were never finished.
    Abandoned { count: u64 },
}

impl DrainOutcome {
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Drained)
    }
}

/// A fixed set of click workers sharing one [`ClickReceiver`].
///
/// Each worker loops independently: wait for an event, increment the counter of
/// its link, repeat. A persistence error is logged and the event discarded; no
/// retries. Workers exit once the channel is closed and empty.
///
/// # Shutdown
///
/// Close the [`crate::domain::click_channel::ClickChannel`] first, then call
/// [`ClickWorkerPool::shutdown`] with a grace period.
pub struct ClickWorkerPool {
    workers: JoinSet<()>,
    worker_count: usize,
    metrics: Arc<PipelineMetrics>,
}

impl ClickWorkerPool {
    /// Spawns `worker_count` workers (minimum 1) on the current runtime.
    pub fn start(
        receiver: ClickReceiver,
        repository: Arc<dyn ClickRepository>,
        worker_count: usize,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        let worker_count = worker_count.max(1);
        let mut workers = JoinSet::new();

        for worker_id in 0..worker_count {
            workers.spawn(run_click_worker(
                worker_id,
                receiver.clone(),
                repository.clone(),
                metrics.clone(),
            ));
        }

        info!(workers = worker_count, "Click worker pool started");

        Self {
            workers,
            worker_count,
            metrics,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Waits up to `grace` for the workers to drain the channel.
    ///
    /// Workers still running when the grace period elapses are aborted. The
    /// accepted events that were neither persisted nor failed by then are
    /// counted as abandoned; an event whose increment was in flight at the
    /// moment of abortion is included in that count.
    pub async fn shutdown(mut self, grace: Duration) -> DrainOutcome {
        let workers = &mut self.workers;
        let drained = timeout(grace, async {
            while let Some(result) = workers.join_next().await {
                if let Err(e) = result
                    && e.is_panic()
                {
                    error!(error = %e, "Click worker panicked");
                }
            }
        })
        .await;

        if drained.is_err() {
            self.workers.abort_all();
            while self.workers.join_next().await.is_some() {}
        }

        let outstanding = self.metrics.snapshot().outstanding();
        if outstanding == 0 {
            info!("Click worker pool drained");
            return DrainOutcome::Drained;
        }

        self.metrics.record_abandoned(outstanding);
        warn!(
            abandoned = outstanding,
            grace_ms = grace.as_millis() as u64,
            "Click workers did not finish within the grace period, abandoning remaining events"
        );
        DrainOutcome::Abandoned { count: outstanding }
    }
}

async fn run_click_worker(
    worker_id: usize,
    receiver: ClickReceiver,
    repository: Arc<dyn ClickRepository>,
    metrics: Arc<PipelineMetrics>,
) {
    debug!(worker_id, "Click worker started");

    while let Some(event) = receiver.recv().await {
        match repository.increment_count(event.link_id).await {
            Ok(()) => metrics.record_processed(),
            Err(e) => {
                metrics.record_failed();
                error!(
                    worker_id,
                    link_id = event.link_id,
                    error = %e,
                    "Failed to record click, discarding event"
                );
            }
        }
    }

    debug!(worker_id, "Click worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::click_channel::ClickChannel;
    use crate::domain::click_event::ClickEvent;
    use crate::domain::repositories::MockClickRepository;
    use crate::error::AppError;
    use serde_json::json;

    fn pipeline(capacity: usize) -> (ClickChannel, ClickReceiver, Arc<PipelineMetrics>) {
        let metrics = Arc::new(PipelineMetrics::new());
        let (channel, rx) = ClickChannel::new(capacity, metrics.clone());
        (channel, rx, metrics)
    }

    #[tokio::test]
    async fn test_worker_persists_each_event_once() {
        let (channel, rx, metrics) = pipeline(16);

        let mut mock_repo = MockClickRepository::new();
        mock_repo
            .expect_increment_count()
            .withf(|link_id| *link_id == 42)
            .times(5)
            .returning(|_| Ok(()));

        for _ in 0..5 {
            assert!(channel.enqueue(ClickEvent::new(42, None, None)));
        }

        let pool = ClickWorkerPool::start(rx, Arc::new(mock_repo), 2, metrics.clone());
        channel.close();

        let outcome = pool.shutdown(Duration::from_secs(5)).await;

        assert_eq!(outcome, DrainOutcome::Drained);
        assert_eq!(metrics.snapshot().processed, 5);
    }

    #[tokio::test]
    async fn test_persistence_error_is_discarded_without_retry() {
        let (channel, rx, metrics) = pipeline(16);

        let mut mock_repo = MockClickRepository::new();
        mock_repo
            .expect_increment_count()
            .withf(|link_id| *link_id == 1)
            .times(1)
            .returning(|_| Err(AppError::internal("Database error", json!({}))));
        mock_repo
            .expect_increment_count()
            .withf(|link_id| *link_id == 2)
            .times(1)
            .returning(|_| Ok(()));

        channel.enqueue(ClickEvent::new(1, None, None));
        channel.enqueue(ClickEvent::new(2, None, None));

        let pool = ClickWorkerPool::start(rx, Arc::new(mock_repo), 1, metrics.clone());
        channel.close();

        let outcome = pool.shutdown(Duration::from_secs(5)).await;

        assert!(outcome.is_clean());
        let snap = metrics.snapshot();
        assert_eq!(snap.processed, 1);
        assert_eq!(snap.failed, 1);
        assert_eq!(snap.abandoned, 0);
    }

    #[tokio::test]
    async fn test_zero_workers_is_raised_to_one() {
        let (channel, rx, metrics) = pipeline(4);
        let mock_repo = MockClickRepository::new();

        let pool = ClickWorkerPool::start(rx, Arc::new(mock_repo), 0, metrics);
        assert_eq!(pool.worker_count(), 1);

        channel.close();
        assert!(pool.shutdown(Duration::from_secs(1)).await.is_clean());
    }

    struct HangingClickRepository;

    #[async_trait::async_trait]
    impl ClickRepository for HangingClickRepository {
        async fn increment_count(&self, _link_id: i64) -> Result<(), AppError> {
            std::future::pending().await
        }

        async fn count_for_link(&self, _link_id: i64) -> Result<i64, AppError> {
            Ok(0)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_abandons_after_grace_period() {
        let (channel, rx, metrics) = pipeline(8);

        for _ in 0..3 {
            assert!(channel.enqueue(ClickEvent::new(1, None, None)));
        }
        let pool = ClickWorkerPool::start(rx, Arc::new(HangingClickRepository), 1, metrics.clone());
        channel.close();

        let outcome = pool.shutdown(Duration::from_millis(50)).await;

        assert_eq!(outcome, DrainOutcome::Abandoned { count: 3 });
        let snap = metrics.snapshot();
        assert_eq!(snap.abandoned, 3);
        assert_eq!(snap.processed, 0);
    }
}
