//! Repository trait for click counters.

use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for per-link click counts.
///
/// Up to `W` click workers call [`ClickRepository::increment_count`] at the same
/// time, possibly for the same link. Implementations must make the increment
/// atomic; the worker pool does no locking of its own.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClickRepository: Send + Sync {
    /// Atomically adds one click to the counter of `link_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link does not exist.
    /// Returns [`AppError::Internal`] on storage errors.
    async fn increment_count(&self, link_id: i64) -> Result<(), AppError>;

    /// Returns the current click count of `link_id`.
    async fn count_for_link(&self, link_id: i64) -> Result<i64, AppError>;
}
