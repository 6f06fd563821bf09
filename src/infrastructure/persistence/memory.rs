//! In-process repository implementations.
//!
//! Used by the integration tests and for running the service without a
//! database. Both repositories share one store so click counts are
//! visible through [`LinkRepository::find_by_code`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::entities::{Link, NewLink};
use crate::domain::repositories::{ClickRepository, LinkRepository};
use crate::error::AppError;

#[derive(Default)]
struct MemoryStore {
    next_id: i64,
    links: HashMap<i64, Link>,
    by_code: HashMap<String, i64>,
}

type SharedStore = Arc<Mutex<MemoryStore>>;

fn lock(store: &SharedStore) -> MutexGuard<'_, MemoryStore> {
    // A panic while holding the guard cannot leave the maps half-updated.
    store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Link storage backed by a mutex-guarded map.
#[derive(Clone, Default)]
pub struct InMemoryLinkRepository {
    store: SharedStore,
}

impl InMemoryLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a click repository that counts into the same store.
    pub fn click_repository(&self) -> InMemoryClickRepository {
        InMemoryClickRepository {
            store: Arc::clone(&self.store),
        }
    }

    /// Looks a link up by id.
    pub fn get(&self, link_id: i64) -> Option<Link> {
        lock(&self.store).links.get(&link_id).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.store).links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl LinkRepository for InMemoryLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        let mut store = lock(&self.store);

        if store.by_code.contains_key(&new_link.code) {
            return Err(AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": "links_code_key" }),
            ));
        }

        store.next_id += 1;
        let id = store.next_id;
        let link = Link::new(id, new_link.code.clone(), new_link.long_url, Utc::now());

        store.by_code.insert(new_link.code, id);
        store.links.insert(id, link.clone());

        Ok(link)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        let store = lock(&self.store);
        Ok(store
            .by_code
            .get(code)
            .and_then(|id| store.links.get(id))
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<Link>, AppError> {
        let store = lock(&self.store);
        let mut links: Vec<Link> = store.links.values().cloned().collect();
        links.sort_by_key(|link| link.id);
        Ok(links)
    }

    async fn update_health(
        &self,
        link_id: i64,
        healthy: bool,
        checked_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut store = lock(&self.store);
        let link = store
            .links
            .get_mut(&link_id)
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "link_id": link_id })))?;

        link.healthy = healthy;
        link.last_checked_at = Some(checked_at);
        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Click counters stored on the links of an [`InMemoryLinkRepository`].
#[derive(Clone)]
pub struct InMemoryClickRepository {
    store: SharedStore,
}

#[async_trait]
impl ClickRepository for InMemoryClickRepository {
    async fn increment_count(&self, link_id: i64) -> Result<(), AppError> {
        let mut store = lock(&self.store);
        let link = store
            .links
            .get_mut(&link_id)
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "link_id": link_id })))?;

        link.click_count += 1;
        Ok(())
    }

    async fn count_for_link(&self, link_id: i64) -> Result<i64, AppError> {
        lock(&self.store)
            .links
            .get(&link_id)
            .map(|link| link.click_count)
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "link_id": link_id })))
    }
}
