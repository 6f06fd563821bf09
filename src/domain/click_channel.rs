//! Bounded hand-off queue between redirect handling and the click workers.
//!
//! The channel is created once by the lifecycle coordinator and shared through an
//! `Arc`. Producers call [`ClickChannel::enqueue`], which never waits: when the
//! buffer is full the event is dropped and counted. After [`ClickChannel::close`]
//! every enqueue is rejected, while events already buffered remain available to
//! the workers until the queue is empty.

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};

use crate::domain::click_event::ClickEvent;
use crate::domain::metrics::PipelineMetrics;

/// Producer side of the click pipeline.
pub struct ClickChannel {
    /// `None` once the channel is closed. Dropping the only sender lets the
    /// receivers observe end-of-stream after the buffer is drained.
    sender: RwLock<Option<mpsc::Sender<ClickEvent>>>,
    capacity: usize,
    metrics: Arc<PipelineMetrics>,
}

/// Consumer side of the click pipeline, shared by all workers.
///
/// Cloning yields another handle to the same queue; each event is handed to
/// exactly one caller of [`ClickReceiver::recv`].
#[derive(Clone)]
pub struct ClickReceiver {
    inner: Arc<Mutex<mpsc::Receiver<ClickEvent>>>,
}

impl ClickChannel {
    /// Creates a channel holding at most `capacity` events (minimum 1).
    pub fn new(capacity: usize, metrics: Arc<PipelineMetrics>) -> (Self, ClickReceiver) {
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);

        let channel = Self {
            sender: RwLock::new(Some(tx)),
            capacity,
            metrics,
        };
        let receiver = ClickReceiver {
            inner: Arc::new(Mutex::new(rx)),
        };

        (channel, receiver)
    }

    /// Offers an event to the pipeline without waiting.
    ///
    /// Returns `true` if the event was queued. Returns `false` if the buffer is
    /// full or the channel is closed; the event is discarded in both cases and
    /// the matching counter is incremented.
    pub fn enqueue(&self, event: ClickEvent) -> bool {
        let guard = self.sender.read().unwrap_or_else(PoisonError::into_inner);

        let Some(sender) = guard.as_ref() else {
            self.metrics.record_rejected_closed();
            debug!(link_id = event.link_id, "Click channel closed, rejecting event");
            return false;
        };

        match sender.try_send(event) {
            Ok(()) => {
                self.metrics.record_accepted();
                true
            }
            Err(mpsc::error::TrySendError::Full(event)) => {
                self.metrics.record_dropped();
                warn!(
                    link_id = event.link_id,
                    capacity = self.capacity,
                    "Click channel full, dropping click event"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                self.metrics.record_rejected_closed();
                warn!(
                    link_id = event.link_id,
                    "Click receivers are gone, rejecting event"
                );
                false
            }
        }
    }

    /// Stops accepting events. Buffered events stay available to the workers.
    ///
    /// Calling `close` more than once has no further effect.
    pub fn close(&self) {
        let mut guard = self.sender.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(sender) = guard.take() {
            let queued = sender.max_capacity() - sender.capacity();
            info!(queued, "Click channel closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Configured buffer size.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of events waiting in the buffer.
    ///
    /// Once the channel is closed the buffer can no longer be observed from the
    /// producer side, so this falls back to the accepted-but-unfinished count.
    pub fn len(&self) -> usize {
        match self
            .sender
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            Some(sender) => sender.max_capacity() - sender.capacity(),
            None => self.metrics.snapshot().outstanding() as usize,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn metrics(&self) -> &Arc<PipelineMetrics> {
        &self.metrics
    }
}

impl ClickReceiver {
    /// Waits for the next event.
    ///
    /// Returns `None` once the channel is closed and every buffered event has
    /// been handed out.
    pub async fn recv(&self) -> Option<ClickEvent> {
        self.inner.lock().await.recv().await
    }
}
