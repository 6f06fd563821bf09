//! Shared state handed to every request handler.

use std::sync::Arc;

use tokio::sync::watch;

use crate::application::services::LinkService;
use crate::domain::click_channel::ClickChannel;
use crate::domain::repositories::{ClickRepository, LinkRepository};
use crate::domain::url_monitor::MonitorState;

#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService>,
    pub links: Arc<dyn LinkRepository>,
    pub click_channel: Arc<ClickChannel>,
    pub monitor_state: watch::Receiver<MonitorState>,
}

impl AppState {
    pub fn new(
        links: Arc<dyn LinkRepository>,
        clicks: Arc<dyn ClickRepository>,
        click_channel: Arc<ClickChannel>,
        monitor_state: watch::Receiver<MonitorState>,
        base_url: &str,
    ) -> Self {
        Self {
            link_service: Arc::new(LinkService::new(links.clone(), clicks, base_url)),
            links,
            click_channel,
            monitor_state,
        }
    }
}
