//! Handler for link statistics.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::dto::stats::StatsResponse;
use crate::error::AppError;
use crate::state::AppState;

/// Returns the click total and last health check of a short link.
///
/// # Endpoint
///
/// `GET /api/v1/links/{code}/stats`
///
/// The click total counts persisted clicks only; events still queued in the
/// click pipeline are not included yet.
///
/// # Errors
///
/// Returns 404 Not Found if the short code doesn't exist.
pub async fn stats_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<StatsResponse>, AppError> {
    let stats = state.link_service.get_link_stats(&code).await?;
    Ok(Json(stats.into()))
}
