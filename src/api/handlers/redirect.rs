//! Handler for short URL redirect.

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use std::net::SocketAddr;
use tracing::debug;

use crate::domain::click_event::ClickEvent;
use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Click Tracking
///
/// A [`ClickEvent`] is offered to the click channel before responding. The
/// offer never waits: when the queue is full or closed the click is dropped
/// (and counted by the channel) while the redirect still succeeds.
///
/// # Errors
///
/// Returns 404 Not Found if the short code doesn't exist.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Result<impl IntoResponse, AppError> {
    let link = state.link_service.get_link_by_code(&code).await?;

    let click_event = ClickEvent::new(
        link.id,
        headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok()),
        Some(addr.ip().to_string()),
    );

    if !state.click_channel.enqueue(click_event) {
        debug!(code = %code, link_id = link.id, "Click not recorded");
    }

    Ok((StatusCode::FOUND, [(header::LOCATION, link.long_url)]))
}
