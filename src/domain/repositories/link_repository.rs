//! Repository trait for short link data access.

use crate::domain::entities::{Link, NewLink};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository interface for short links.
///
/// Read access is used by the redirect and stats handlers (`find_by_code`) and
/// by the URL monitor (`list_all`). The monitor is the only caller of
/// `update_health`.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::InMemoryLinkRepository`] - in-process store
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Creates a new short link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the short code already exists.
    /// Returns [`AppError::Internal`] on storage errors.
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError>;

    /// Finds a link by its short code.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Link))` if found
    /// - `Ok(None)` if not found
    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError>;

    /// Returns a snapshot of every stored link.
    ///
    /// Links created after the call are not included.
    async fn list_all(&self) -> Result<Vec<Link>, AppError>;

    /// Records the outcome of a reachability probe.
    ///
    /// Idempotent: writing the same status twice leaves the link unchanged apart
    /// from `last_checked_at`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link no longer exists.
    async fn update_health(
        &self,
        link_id: i64,
        healthy: bool,
        checked_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    /// Checks that the backing store answers.
    async fn ping(&self) -> Result<(), AppError>;
}
