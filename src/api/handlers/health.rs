//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::domain::url_monitor::MonitorState;
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Components Checked
///
/// 1. **Database**: Round trip through the link repository
/// 2. **Click Queue**: Open, with capacity and current depth
/// 3. **Monitor**: Background URL monitor is running
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.2.0",
///   "checks": {
///     "database": { "status": "ok", "message": "Connected" },
///     "click_queue": { "status": "ok", "message": "Queued 3 of 1000" },
///     "monitor": { "status": "ok", "message": "running" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let database = check_database(&state).await;
    let click_queue = check_click_queue(&state);
    let monitor = check_monitor(&state);

    let all_healthy = database.is_ok() && click_queue.is_ok() && monitor.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            database,
            click_queue,
            monitor,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn check_database(state: &AppState) -> CheckStatus {
    match state.links.ping().await {
        Ok(()) => CheckStatus::ok("Connected"),
        Err(e) => CheckStatus::error(format!("Database error: {}", e)),
    }
}

/// Checks if the click tracking queue still accepts events.
fn check_click_queue(state: &AppState) -> CheckStatus {
    let channel = &state.click_channel;
    if channel.is_closed() {
        CheckStatus::error("Click queue is closed")
    } else {
        CheckStatus::ok(format!(
            "Queued {} of {}",
            channel.len(),
            channel.capacity()
        ))
    }
}

fn check_monitor(state: &AppState) -> CheckStatus {
    let current = *state.monitor_state.borrow();
    let label = match current {
        MonitorState::Idle => "idle",
        MonitorState::Running => "running",
        MonitorState::Cancelling => "cancelling",
        MonitorState::Stopped => "stopped",
    };

    if current == MonitorState::Running {
        CheckStatus::ok(label)
    } else {
        CheckStatus::error(label)
    }
}
