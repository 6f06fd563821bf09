//! Link entity representing a shortened URL mapping.

use chrono::{DateTime, Utc};

/// Maximum length of a short code.
pub const MAX_CODE_LENGTH: usize = 10;

/// A shortened URL with its health and click metadata.
///
/// `healthy` and `last_checked_at` are written only by the URL monitor;
/// `click_count` is incremented only by the click workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub id: i64,
    pub code: String,
    pub long_url: String,
    pub created_at: DateTime<Utc>,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub healthy: bool,
    pub click_count: i64,
}

impl Link {
    /// Creates a link that has never been probed or clicked.
    pub fn new(id: i64, code: String, long_url: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            code,
            long_url,
            created_at,
            last_checked_at: None,
            healthy: true,
            click_count: 0,
        }
    }

    /// Returns true if the monitor has probed this link at least once.
    pub fn is_checked(&self) -> bool {
        self.last_checked_at.is_some()
    }
}

/// Input data for creating a new link.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub code: String,
    pub long_url: String,
}
