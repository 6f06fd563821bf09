#![allow(dead_code)]

use async_trait::async_trait;
use axum::{Router, extract::ConnectInfo, routing::get};
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tower::Layer;
use url_shortener::api::handlers::{health_handler, redirect_handler};
use url_shortener::api::routes::v1_routes;
use url_shortener::domain::click_channel::{ClickChannel, ClickReceiver};
use url_shortener::domain::entities::{Link, NewLink};
use url_shortener::domain::metrics::PipelineMetrics;
use url_shortener::domain::prober::{ProbeError, ProbeOutcome, UrlProber};
use url_shortener::domain::repositories::LinkRepository;
use url_shortener::domain::url_monitor::MonitorState;
use url_shortener::infrastructure::persistence::{InMemoryClickRepository, InMemoryLinkRepository};
use url_shortener::state::AppState;

pub const BASE_URL: &str = "http://sho.rt";

/// Everything a handler test needs, backed by the in-memory repositories.
pub struct TestContext {
    pub links: InMemoryLinkRepository,
    pub clicks: InMemoryClickRepository,
    pub channel: Arc<ClickChannel>,
    pub receiver: ClickReceiver,
    pub metrics: Arc<PipelineMetrics>,
    pub monitor_state: watch::Sender<MonitorState>,
    pub state: AppState,
}

pub fn test_context(click_capacity: usize) -> TestContext {
    let links = InMemoryLinkRepository::new();
    let clicks = links.click_repository();
    let metrics = Arc::new(PipelineMetrics::new());
    let (channel, receiver) = ClickChannel::new(click_capacity, metrics.clone());
    let channel = Arc::new(channel);
    let (monitor_state, monitor_rx) = watch::channel(MonitorState::Running);

    let state = AppState::new(
        Arc::new(links.clone()),
        Arc::new(clicks.clone()),
        channel.clone(),
        monitor_rx,
        BASE_URL,
    );

    TestContext {
        links,
        clicks,
        channel,
        receiver,
        metrics,
        monitor_state,
        state,
    }
}

/// Same routes as the production router, with a fixed peer address.
pub fn test_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .nest("/api/v1", v1_routes())
        .route("/{code}", get(redirect_handler))
        .layer(MockConnectInfoLayer)
        .with_state(state)
}

pub async fn create_link(repo: &InMemoryLinkRepository, code: &str, url: &str) -> Link {
    repo.create(NewLink {
        code: code.to_string(),
        long_url: url.to_string(),
    })
    .await
    .unwrap()
}

/// Prober whose answers are scripted per URL.
///
/// Each URL has a queue of outcomes; the last outcome repeats once the queue
/// is down to one entry. Unknown URLs are reachable.
#[derive(Default)]
pub struct ScriptedProber {
    script: Mutex<HashMap<String, VecDeque<bool>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, url: &str, outcomes: &[bool]) {
        self.script
            .lock()
            .unwrap()
            .insert(url.to_string(), outcomes.iter().copied().collect());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl UrlProber for ScriptedProber {
    async fn probe(&self, url: &str) -> Result<ProbeOutcome, ProbeError> {
        self.calls.lock().unwrap().push(url.to_string());

        let reachable = {
            let mut script = self.script.lock().unwrap();
            match script.get_mut(url) {
                Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(true),
                Some(queue) => queue.front().copied().unwrap_or(true),
                None => true,
            }
        };

        if reachable {
            Ok(ProbeOutcome::reachable(200))
        } else {
            Err(ProbeError::Transport("connection refused".to_string()))
        }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}
