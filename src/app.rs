//! Terminal front-end state.
//!
//! The service owns content and rotation; `App` only holds what the current
//! frame shows plus UI flags.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::service::{ContentService, DisplayItems};
use crate::source::Category;

pub struct App {
    service: Arc<ContentService>,
    /// Items rendered this frame.
    pub shown: DisplayItems,
    /// Whether the user has requested to quit.
    pub quit: bool,
}

impl App {
    pub fn new(service: Arc<ContentService>) -> Self {
        let shown = service.snapshot();
        Self {
            service,
            shown,
            quit: false,
        }
    }

    /// Pull the latest snapshot from the service.  Called once per frame.
    pub fn refresh(&mut self) {
        self.shown = self.service.snapshot();
    }

    /// Skip ahead to the next item in every category.
    pub fn next_item(&mut self) {
        self.service.rotate();
        self.refresh();
    }

    /// Human-readable content age for the status bar.
    pub fn status(&self, now: DateTime<Utc>) -> String {
        match self.shown.fetched_at {
            None => "Loading daily content…".to_string(),
            Some(at) => {
                let minutes = (now - at).num_minutes().max(0);
                match minutes {
                    0 => "Updated just now".to_string(),
                    m if m < 60 => format!("Updated {m} min ago"),
                    m => format!("Updated {}h {}m ago", m / 60, m % 60),
                }
            }
        }
    }

    /// Which categories are currently showing bundled content instead of
    /// live provider content.
    pub fn source_status(&self) -> String {
        if self.shown.fetched_at.is_none() {
            return "bundled content".to_string();
        }
        let provenance: Vec<_> = Category::ALL
            .iter()
            .filter_map(|&category| Some((category, self.shown.provenance(category)?)))
            .collect();
        if provenance.iter().all(|(_, p)| p.live == 0) {
            return "bundled content".to_string();
        }

        let degraded: Vec<String> = provenance
            .iter()
            .filter(|(_, p)| !p.is_live())
            .map(|(category, p)| format!("{category} {}/{}", p.fallback(), p.total))
            .collect();
        if degraded.is_empty() {
            "all live".to_string()
        } else {
            format!("fallback: {}", degraded.join(", "))
        }
    }
}
