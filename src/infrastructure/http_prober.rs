//! HTTP reachability probe backed by `reqwest`.

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use std::time::Duration;
use tracing::debug;

use crate::domain::prober::{ProbeError, ProbeOutcome, UrlProber};

const USER_AGENT: &str = concat!("url-shortener-monitor/", env!("CARGO_PKG_VERSION"));

/// Probes a link with a `HEAD` request, retrying once with `GET` when the
/// target rejects `HEAD` (405 or 501).
///
/// A link is reachable when the final response status is below 400.
/// Redirects are followed up to five hops.
pub struct HttpProber {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpProber {
    /// Builds a prober whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client, timeout })
    }

    async fn send(&self, method: Method, url: &str) -> Result<StatusCode, ProbeError> {
        let response = self
            .client
            .request(method, url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        Ok(response.status())
    }

    fn classify(&self, error: reqwest::Error) -> ProbeError {
        if error.is_timeout() {
            ProbeError::Timeout(self.timeout)
        } else if error.is_builder() {
            ProbeError::InvalidUrl(error.to_string())
        } else {
            ProbeError::Transport(error.to_string())
        }
    }
}

fn is_head_rejected(status: StatusCode) -> bool {
    status == StatusCode::METHOD_NOT_ALLOWED || status == StatusCode::NOT_IMPLEMENTED
}

fn outcome_for(status: StatusCode) -> ProbeOutcome {
    if status.as_u16() < 400 {
        ProbeOutcome::reachable(status.as_u16())
    } else {
        ProbeOutcome::unreachable(status.as_u16())
    }
}

#[async_trait]
impl UrlProber for HttpProber {
    async fn probe(&self, url: &str) -> Result<ProbeOutcome, ProbeError> {
        url::Url::parse(url).map_err(|e| ProbeError::InvalidUrl(e.to_string()))?;

        let mut status = self.send(Method::HEAD, url).await?;
        if is_head_rejected(status) {
            debug!(url, status = status.as_u16(), "HEAD rejected, retrying with GET");
            status = self.send(Method::GET, url).await?;
        }

        Ok(outcome_for(status))
    }
}
