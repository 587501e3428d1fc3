//! "On this day" history provider.
//!
//! A single request returns every recorded event for today's date, oldest
//! first.  Events are sampled evenly across that list so the panel spans
//! several eras instead of showing `count` ancient events.

use async_trait::async_trait;
use serde::Deserialize;

use super::{fallback, Category, ContentItem, ContentSource, FetchError, HttpClient, SlotOutcome};
use crate::diagnostics::Diagnostics;

#[derive(Debug, Deserialize)]
struct HistoryPayload {
    data: HistoryData,
}

#[derive(Debug, Deserialize)]
struct HistoryData {
    #[serde(rename = "Events", default)]
    events: Vec<RawEvent>,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    year: String,
    text: String,
}

impl RawEvent {
    /// Events whose year is not a plain integer (e.g. "AD 43", "c. 1000")
    /// are unusable.
    fn normalise(self) -> Option<ContentItem> {
        let year = self.year.trim().parse::<i32>().ok()?;
        let text = self.text.trim();
        if text.is_empty() {
            return None;
        }
        Some(ContentItem::HistoryFact {
            year,
            text: text.to_string(),
        })
    }
}

/// Pick `count` entries spread evenly across `items`, keeping their order.
fn sample_evenly<T>(items: Vec<T>, count: usize) -> Vec<T> {
    let len = items.len();
    if len <= count {
        return items;
    }
    let wanted: Vec<usize> = (0..count).map(|i| i * len / count).collect();
    items
        .into_iter()
        .enumerate()
        .filter(|(i, _)| wanted.contains(i))
        .map(|(_, item)| item)
        .collect()
}

pub struct HistorySource {
    http: HttpClient,
    url: String,
}

impl HistorySource {
    pub fn new(http: HttpClient, url: String) -> Self {
        Self { http, url }
    }

    async fn fetch_batch(&self, count: usize) -> Result<Vec<ContentItem>, FetchError> {
        let payload: HistoryPayload = self.http.get_json(&self.url).await?;
        let usable: Vec<ContentItem> = payload
            .data
            .events
            .into_iter()
            .filter_map(RawEvent::normalise)
            .collect();
        Ok(sample_evenly(usable, count))
    }
}

#[async_trait]
impl ContentSource for HistorySource {
    fn category(&self) -> Category {
        Category::History
    }

    async fn fetch_slots(&self, count: usize, diagnostics: &dyn Diagnostics) -> Vec<SlotOutcome> {
        let batch = self.fetch_batch(count).await;
        fallback::batch_slots(Category::History, batch, diagnostics)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
