//! Link creation, lookup and statistics service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, warn};

use crate::domain::entities::{Link, NewLink};
use crate::domain::repositories::{ClickRepository, LinkRepository};
use crate::error::AppError;
use crate::utils::code_generator::{generate_code, is_well_formed};
use crate::utils::url_normalizer::normalize_url;

/// Maximum attempts to find an unused generated code.
const MAX_CODE_ATTEMPTS: usize = 10;

/// Click and health summary of one short link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkStats {
    pub link: Link,
    pub total_clicks: i64,
}

impl LinkStats {
    pub fn last_checked_at(&self) -> Option<DateTime<Utc>> {
        self.link.last_checked_at
    }
}

/// Service for creating and resolving shortened links.
///
/// Handles URL normalization and collision-free code generation. Click
/// counting does not go through this service; it happens in the click
/// pipeline.
pub struct LinkService {
    links: Arc<dyn LinkRepository>,
    clicks: Arc<dyn ClickRepository>,
    base_url: String,
}

impl LinkService {
    /// Creates a new link service. `base_url` prefixes every full short URL.
    pub fn new(
        links: Arc<dyn LinkRepository>,
        clicks: Arc<dyn ClickRepository>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            links,
            clicks,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Creates a short link for `long_url` under a freshly generated code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the URL is not an absolute http(s) URL.
    /// Returns [`AppError::Internal`] if no unused code was found or on storage errors.
    pub async fn create_short_link(&self, long_url: &str) -> Result<Link, AppError> {
        let normalized_url = normalize_url(long_url).map_err(|e| {
            AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() }))
        })?;

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let code = generate_code()?;

            // Two requests can race for the same code; the unique index settles it.
            if self.links.find_by_code(&code).await?.is_some() {
                debug!(attempt, "Generated code already taken");
                continue;
            }

            let new_link = NewLink {
                code,
                long_url: normalized_url.clone(),
            };

            match self.links.create(new_link).await {
                Ok(link) => return Ok(link),
                Err(AppError::Conflict { .. }) => {
                    debug!(attempt, "Generated code taken concurrently");
                }
                Err(e) => return Err(e),
            }
        }

        warn!(
            attempts = MAX_CODE_ATTEMPTS,
            "Could not find an unused short code"
        );
        Err(AppError::internal(
            "Failed to generate unique code",
            json!({ "reason": "Too many collisions" }),
        ))
    }

    /// Retrieves a link by its short code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no link matches the code, including
    /// codes that are not well formed.
    pub async fn get_link_by_code(&self, code: &str) -> Result<Link, AppError> {
        if !is_well_formed(code) {
            return Err(not_found(code));
        }

        self.links
            .find_by_code(code)
            .await?
            .ok_or_else(|| not_found(code))
    }

    /// Returns the link together with its persisted click total.
    pub async fn get_link_stats(&self, code: &str) -> Result<LinkStats, AppError> {
        let link = self.get_link_by_code(code).await?;
        let total_clicks = self.clicks.count_for_link(link.id).await?;

        Ok(LinkStats { link, total_clicks })
    }

    /// Builds the public short URL for `code`.
    pub fn short_url(&self, code: &str) -> String {
        format!("{}/{}", self.base_url, code)
    }
}

fn not_found(code: &str) -> AppError {
    AppError::not_found("Short link not found", json!({ "code": code }))
}
