//! Reachability probe abstraction used by the URL monitor.

use async_trait::async_trait;
use std::time::Duration;

/// Result of a probe that reached the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// HTTP status returned by the target, if the probe speaks HTTP.
    pub status: Option<u16>,
    /// Whether the target counts as reachable.
    pub reachable: bool,
}

impl ProbeOutcome {
    pub fn reachable(status: u16) -> Self {
        Self {
            status: Some(status),
            reachable: true,
        }
    }

    pub fn unreachable(status: u16) -> Self {
        Self {
            status: Some(status),
            reachable: false,
        }
    }
}

/// Errors raised while probing a link.
///
/// All of them mark the link unhealthy; none of them stop the monitor.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("invalid target URL: {0}")]
    InvalidUrl(String),
}

/// Issues a single reachability check against a URL.
///
/// Implementations may apply their own timeout; the monitor additionally wraps
/// every call in its per-probe deadline.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UrlProber: Send + Sync {
    async fn probe(&self, url: &str) -> Result<ProbeOutcome, ProbeError>;
}
