//! DTOs for link statistics.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::services::LinkStats;

/// Click total and last known health of a short link.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub short_code: String,
    pub long_url: String,
    pub total_clicks: i64,
    pub healthy: bool,
    pub last_checked_at: Option<DateTime<Utc>>,
}

impl From<LinkStats> for StatsResponse {
    fn from(stats: LinkStats) -> Self {
        let last_checked_at = stats.last_checked_at();
        Self {
            short_code: stats.link.code,
            long_url: stats.link.long_url,
            total_clicks: stats.total_clicks,
            healthy: stats.link.healthy,
            last_checked_at,
        }
    }
}
