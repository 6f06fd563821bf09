mod common;

use common::ScriptedProber;
use std::sync::Arc;
use std::time::Duration;
use url_shortener::domain::metrics::MonitorMetrics;
use url_shortener::domain::url_monitor::{
    MonitorSettings, MonitorState, MonitorStopOutcome, UrlMonitor,
};
use url_shortener::infrastructure::persistence::InMemoryLinkRepository;

fn settings() -> MonitorSettings {
    MonitorSettings::new(Duration::from_secs(60), Duration::from_secs(5), 4)
}

#[tokio::test]
async fn test_health_follows_latest_probe() {
    let repo = InMemoryLinkRepository::new();
    let flaky = common::create_link(&repo, "flaky", "https://flaky.example").await;
    let stable = common::create_link(&repo, "stable", "https://stable.example").await;

    let prober = Arc::new(ScriptedProber::new());
    prober.script("https://flaky.example", &[false, true]);

    let monitor = UrlMonitor::new(
        Arc::new(repo.clone()),
        prober.clone(),
        settings(),
        Arc::new(MonitorMetrics::new()),
    );

    let first = monitor.run_tick().await.unwrap();
    assert_eq!(first.probed, 2);
    assert_eq!(first.unhealthy, 1);
    assert!(!repo.get(flaky.id).unwrap().healthy);
    assert!(repo.get(stable.id).unwrap().healthy);

    let second = monitor.run_tick().await.unwrap();
    assert_eq!(second.healthy, 2);
    assert!(repo.get(flaky.id).unwrap().healthy);
    assert!(repo.get(flaky.id).unwrap().last_checked_at.is_some());

    assert_eq!(prober.calls().len(), 4);
}

#[tokio::test]
async fn test_empty_store_tick() {
    let monitor = UrlMonitor::new(
        Arc::new(InMemoryLinkRepository::new()),
        Arc::new(ScriptedProber::new()),
        settings(),
        Arc::new(MonitorMetrics::new()),
    );

    let report = monitor.run_tick().await.unwrap();

    assert_eq!(report.probed, 0);
    assert_eq!(report.skipped, 0);
}

#[tokio::test(start_paused = true)]
async fn test_periodic_ticks_and_stop() {
    let repo = InMemoryLinkRepository::new();
    let link = common::create_link(&repo, "down", "https://down.example").await;

    let prober = Arc::new(ScriptedProber::new());
    prober.script("https://down.example", &[false]);

    let metrics = Arc::new(MonitorMetrics::new());
    let handle = UrlMonitor::new(Arc::new(repo.clone()), prober, settings(), metrics.clone()).start();
    assert_eq!(handle.state(), MonitorState::Running);

    // Nothing happens before the first interval has elapsed.
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(metrics.snapshot().ticks, 0);
    assert!(repo.get(link.id).unwrap().last_checked_at.is_none());

    tokio::time::sleep(Duration::from_secs(95)).await;
    assert_eq!(metrics.snapshot().ticks, 2);
    assert!(!repo.get(link.id).unwrap().healthy);

    let mut states = handle.subscribe();
    assert_eq!(
        handle.stop(Duration::from_secs(1)).await,
        MonitorStopOutcome::Stopped
    );
    assert_eq!(*states.borrow_and_update(), MonitorState::Stopped);
}
