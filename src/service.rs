//! The content service: the one entry point front ends talk to.
//!
//! Combines the cache, the fetch orchestrator and the rotation controller.
//! [`ContentService::get_content`] resolves fresh content (fetching on a
//! miss) and [`ContentService::snapshot`] returns whatever is displayable
//! right now without waiting.  [`ContentService::start`] spawns the rotation
//! timer and a freshness check; [`ContentService::stop`] cancels both.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::cache::CacheStore;
use crate::lock::mutex_lock;
use crate::poll::Orchestrator;
use crate::rotation::{RotationController, RotationState};
use crate::source::{fallback, Category, ContentItem, ContentSet, Provenance};

/// One selected item per category, ready to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayItems {
    pub items: BTreeMap<Category, ContentItem>,
    /// Live/bundled split of each category's current result.  Empty before
    /// the first refresh.
    pub provenance: BTreeMap<Category, Provenance>,
    /// When the underlying content was fetched; `None` while showing bundled
    /// content before the first refresh.
    pub fetched_at: Option<DateTime<Utc>>,
}

impl DisplayItems {
    pub fn get(&self, category: Category) -> Option<&ContentItem> {
        self.items.get(&category)
    }

    pub fn provenance(&self, category: Category) -> Option<Provenance> {
        self.provenance.get(&category).copied()
    }
}

struct Inner {
    cache: CacheStore,
    orchestrator: Orchestrator,
    rotation: RotationController,
    /// Held while an orchestration is in flight so concurrent misses share it.
    refresh_gate: tokio::sync::Mutex<()>,
}

impl Inner {
    /// Fresh content from the cache, or from a new orchestration on a miss.
    async fn ensure_fresh(&self) -> Arc<ContentSet> {
        if let Some(entry) = self.cache.read() {
            return Arc::clone(&entry.content);
        }

        let _gate = self.refresh_gate.lock().await;
        // Whoever held the gate before us may already have refreshed.
        if let Some(entry) = self.cache.read() {
            tracing::debug!("cache filled by concurrent refresh");
            return Arc::clone(&entry.content);
        }

        tracing::debug!("cache miss");
        let set = self.orchestrator.refresh().await;
        Arc::clone(&self.cache.write(set).await.content)
    }

    fn select(&self, content: Option<&ContentSet>, fetched_at: Option<DateTime<Utc>>) -> DisplayItems {
        let rotation = self.rotation.state();
        let items = Category::ALL
            .iter()
            .map(|&category| (category, pick(content, &rotation, category)))
            .collect();
        let provenance = Category::ALL
            .iter()
            .filter_map(|&category| {
                let result = content?.get(category)?;
                Some((category, result.provenance()))
            })
            .collect();
        DisplayItems {
            items,
            provenance,
            fetched_at,
        }
    }
}

/// `content[category][index]`, or the first bundled item when there is no
/// content yet.
fn pick(content: Option<&ContentSet>, rotation: &RotationState, category: Category) -> ContentItem {
    content
        .and_then(|set| set.get(category))
        .and_then(|result| result.get_wrapped(rotation.index(category)))
        .cloned()
        .unwrap_or_else(|| fallback::item(category, 0))
}

pub struct ContentService {
    inner: Arc<Inner>,
    rotation_interval: Duration,
    refresh_check_interval: Duration,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ContentService {
    pub fn new(
        cache: CacheStore,
        orchestrator: Orchestrator,
        items_per_category: usize,
        rotation_interval: Duration,
        refresh_check_interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                cache,
                orchestrator,
                rotation: RotationController::new(items_per_category),
                refresh_gate: tokio::sync::Mutex::new(()),
            }),
            rotation_interval,
            refresh_check_interval,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Current display items, refreshing first if the cache is stale.
    pub async fn get_content(&self) -> DisplayItems {
        let content = self.inner.ensure_fresh().await;
        let fetched_at = self.inner.cache.latest().map(|entry| entry.fetched_at);
        self.inner.select(Some(&content), fetched_at)
    }

    /// Display items from whatever content is held right now, stale or not.
    /// Before the first refresh completes this is the first bundled item of
    /// every category.  Never waits.
    pub fn snapshot(&self) -> DisplayItems {
        match self.inner.cache.latest() {
            Some(entry) => self.inner.select(Some(&entry.content), Some(entry.fetched_at)),
            None => self.inner.select(None, None),
        }
    }

    /// Advance rotation by one step.  Normally driven by [`Self::start`].
    pub fn rotate(&self) -> RotationState {
        self.inner.rotation.tick()
    }

    /// Spawn the rotation timer and the freshness check.  Calling `start`
    /// twice without `stop` is a no-op.  Must be called inside a Tokio
    /// runtime.
    pub fn start(&self) {
        let mut tasks = mutex_lock(&self.tasks, "service.start");
        if !tasks.is_empty() {
            return;
        }

        let inner = Arc::clone(&self.inner);
        let every = self.rotation_interval;
        tasks.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
            loop {
                interval.tick().await;
                inner.rotation.tick();
            }
        }));

        let inner = Arc::clone(&self.inner);
        let every = self.refresh_check_interval;
        tasks.push(tokio::spawn(async move {
            // The first tick fires immediately, which performs the initial load.
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                inner.ensure_fresh().await;
            }
        }));

        tracing::info!(
            rotation_secs = self.rotation_interval.as_secs(),
            refresh_check_secs = self.refresh_check_interval.as_secs(),
            "content service started"
        );
    }

    /// Cancel background tasks.  Rotation state is kept; content stays cached.
    pub fn stop(&self) {
        let tasks: Vec<_> = mutex_lock(&self.tasks, "service.stop").drain(..).collect();
        if tasks.is_empty() {
            return;
        }
        for task in tasks {
            task.abort();
        }
        tracing::info!("content service stopped");
    }
}

impl Drop for ContentService {
    fn drop(&mut self) {
        self.stop();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
