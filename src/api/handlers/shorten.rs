//! Handler for link creation endpoint.

use axum::{Json, extract::State, http::StatusCode};
use validator::Validate;

use crate::api::dto::shorten::{ShortenRequest, ShortenResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link for a long URL.
///
/// # Endpoint
///
/// `POST /api/v1/links`
///
/// # Request Body
///
/// ```json
/// { "long_url": "https://example.com/some/page" }
/// ```
///
/// # Response
///
/// `201 Created`
///
/// ```json
/// {
///   "short_code": "Xa3_k9Qz",
///   "long_url": "https://example.com/some/page",
///   "full_short_url": "http://localhost:8080/Xa3_k9Qz"
/// }
/// ```
///
/// # Errors
///
/// Returns 400 Bad Request if the URL is missing, malformed or not http(s).
pub async fn shorten_handler(
    State(state): State<AppState>,
    Json(payload): Json<ShortenRequest>,
) -> Result<(StatusCode, Json<ShortenResponse>), AppError> {
    payload.validate()?;

    let link = state
        .link_service
        .create_short_link(&payload.long_url)
        .await?;

    tracing::info!(code = %link.code, link_id = link.id, "Short link created");

    let full_short_url = state.link_service.short_url(&link.code);

    Ok((
        StatusCode::CREATED,
        Json(ShortenResponse {
            short_code: link.code,
            long_url: link.long_url,
            full_short_url,
        }),
    ))
}
