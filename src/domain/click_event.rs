//! Click event model for asynchronous click tracking.

use chrono::{DateTime, Utc};

/// An in-memory representation of a single redirect hit.
///
/// Created by the redirect handler and handed to the click pipeline through
/// [`crate::domain::click_channel::ClickChannel::enqueue`]. The event is never
/// persisted as a standalone record: a worker consumes it once and turns it into
/// a click-count increment for `link_id`.
///
/// # Usage Flow
///
/// 1. Created in the redirect handler with request metadata
/// 2. Enqueued into the bounded click channel (non-blocking, may be dropped)
/// 3. Claimed by exactly one worker of [`crate::domain::click_worker::ClickWorkerPool`]
/// 4. Discarded after the increment succeeds or fails
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickEvent {
    pub link_id: i64,
    pub clicked_at: DateTime<Utc>,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
}

impl ClickEvent {
    /// Creates a click event stamped with the current time.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let event = ClickEvent::new(42, Some("Mozilla/5.0"), Some("192.168.1.1".to_string()));
    /// ```
    pub fn new(link_id: i64, user_agent: Option<&str>, ip: Option<String>) -> Self {
        Self::at(link_id, Utc::now(), user_agent, ip)
    }

    /// Creates a click event with an explicit timestamp.
    pub fn at(
        link_id: i64,
        clicked_at: DateTime<Utc>,
        user_agent: Option<&str>,
        ip: Option<String>,
    ) -> Self {
        Self {
            link_id,
            clicked_at,
            user_agent: user_agent.map(|s| s.to_string()),
            ip,
        }
    }
}
