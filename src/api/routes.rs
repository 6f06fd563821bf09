//! API route configuration.

use crate::api::handlers::{shorten_handler, stats_handler};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Versioned API routes, nested under `/api/v1`.
///
/// # Endpoints
///
/// - `POST /links`               - Create a short link
/// - `GET  /links/{code}/stats`  - Click total and health of a link
pub fn v1_routes() -> Router<AppState> {
    Router::new()
        .route("/links", post(shorten_handler))
        .route("/links/{code}/stats", get(stats_handler))
}
