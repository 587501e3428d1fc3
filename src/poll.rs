//! Fetch orchestration.
//!
//! Polls every content source concurrently and assembles their results into
//! one [`ContentSet`].  Each source already guarantees a full result, so one
//! slow or failing provider never blocks or fails the others; the worst case
//! is a set made entirely of bundled fallback items.
//!
//! ## For contributors
//!
//! There is no retry here.  A provider gets one attempt per refresh cycle,
//! bounded by the HTTP client's request timeout.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use serde_json::json;

use crate::diagnostics::{Diagnostics, Level};
use crate::source::{fallback, fetch_category, Category, CategoryResult, ContentSet, ContentSource};

pub struct Orchestrator {
    sources: Vec<Arc<dyn ContentSource>>,
    items_per_category: usize,
    diagnostics: Arc<dyn Diagnostics>,
}

impl Orchestrator {
    pub fn new(
        sources: Vec<Arc<dyn ContentSource>>,
        items_per_category: usize,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        Self {
            sources,
            items_per_category,
            diagnostics,
        }
    }

    /// Fetch every category once and return a complete content set.
    pub async fn refresh(&self) -> ContentSet {
        let started = Instant::now();
        tracing::info!(sources = self.sources.len(), "refreshing daily content");

        let n = self.items_per_category;
        let diagnostics = self.diagnostics.as_ref();
        let results = join_all(self.sources.iter().map(|source| async move {
            (source.category(), fetch_category(source.as_ref(), n, diagnostics).await)
        }))
        .await;

        let mut set = ContentSet::default();
        for (category, result) in results {
            set.insert(category, result);
        }

        // A category with no configured source is served from the bundled list.
        for category in Category::ALL {
            if set.get(category).is_none() {
                self.diagnostics.log(
                    Level::Warning,
                    &fallback::source_name(category),
                    &format!("no source configured for {category}, using bundled content"),
                    json!({ "category": category }),
                );
                set.insert(category, CategoryResult::new(fallback::items(category, n)));
            }
        }

        tracing::info!(elapsed_ms = started.elapsed().as_millis() as u64, "daily content refreshed");
        set
    }
}
