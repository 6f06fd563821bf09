mod common;

use axum_test::TestServer;
use url_shortener::domain::url_monitor::MonitorState;

#[tokio::test]
async fn test_health_check_success() {
    let ctx = common::test_context(16);
    let server = TestServer::new(common::test_router(ctx.state.clone())).unwrap();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["checks"]["database"]["status"], "ok");
    assert_eq!(json["checks"]["click_queue"]["status"], "ok");
    assert_eq!(json["checks"]["click_queue"]["message"], "Queued 0 of 16");
    assert_eq!(json["checks"]["monitor"]["message"], "running");
}

#[tokio::test]
async fn test_health_degraded_when_click_queue_closed() {
    let ctx = common::test_context(16);
    ctx.channel.close();
    let server = TestServer::new(common::test_router(ctx.state.clone())).unwrap();

    let response = server.get("/health").await;

    assert_eq!(response.status_code(), 503);
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["checks"]["click_queue"]["status"], "error");
}

#[tokio::test]
async fn test_health_degraded_when_monitor_stopped() {
    let ctx = common::test_context(16);
    ctx.monitor_state.send_replace(MonitorState::Stopped);
    let server = TestServer::new(common::test_router(ctx.state.clone())).unwrap();

    let response = server.get("/health").await;

    assert_eq!(response.status_code(), 503);
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["checks"]["monitor"]["status"], "error");
    assert_eq!(json["checks"]["monitor"]["message"], "stopped");
    assert_eq!(json["checks"]["database"]["status"], "ok");
}
