//! Content provider abstraction layer.
//!
//! This module defines the [`ContentSource`] trait and the shared content
//! types.  Concrete provider adapters live in sub-modules, one per
//! [`Category`].
//!
//! ## For contributors: adding a new provider
//!
//! 1. Create a new file in this directory (e.g. `fact.rs`).
//! 2. Define a struct holding an [`HttpClient`] and the endpoint URL, and
//!    implement [`ContentSource`] for it.  `fetch_slots` only has to return
//!    what it managed to fetch; padding and diagnostics are handled by
//!    [`fetch_category`].
//! 3. Add `mod fact;` below and re-export your struct.
//! 4. Construct an instance in [`default_sources`].

mod content_item;
pub mod fallback;
mod history;
mod joke;
mod quote;
mod trivia;
mod word;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use content_item::{Category, CategoryResult, ContentItem, ContentSet, Provenance};
pub use fallback::SlotOutcome;

use crate::config::{Config, Endpoints};
use crate::diagnostics::Diagnostics;
use history::HistorySource;
use joke::JokeSource;
use quote::QuoteSource;
use trivia::TriviaSource;
use word::WordSource;

/// Why a live fetch produced no usable item.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("HTTP {0}")]
    Status(u16),

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("short payload: expected {expected} items, received {received}")]
    ShortPayload { expected: usize, received: usize },
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = e.status() {
            FetchError::Status(status.as_u16())
        } else if e.is_decode() {
            FetchError::Malformed(e.to_string())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

/// Trait that every content provider adapter must implement.
///
/// The orchestrator calls [`fetch_category`] for every source concurrently,
/// so implementations must be [`Send`] + [`Sync`].
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// The category this source fills.
    fn category(&self) -> Category;

    /// Minimum number of live items required before any of them are used.
    /// Below this the whole category is served from the bundled list.
    fn min_live(&self, _count: usize) -> usize {
        0
    }

    /// Fetch up to `count` items.  Each entry is one slot; a short vector
    /// means the remaining slots could not be filled.  Request failures are
    /// reported through `diagnostics`; padding is not this method's job.
    async fn fetch_slots(&self, count: usize, diagnostics: &dyn Diagnostics) -> Vec<SlotOutcome>;
}

/// Fetch one category and guarantee a complete result of exactly `count`
/// items, mixing live and fallback content as needed.
pub async fn fetch_category(
    source: &dyn ContentSource,
    count: usize,
    diagnostics: &dyn Diagnostics,
) -> CategoryResult {
    let category = source.category();
    let slots = source.fetch_slots(count, diagnostics).await;
    let min_live = source.min_live(count).min(count);
    fallback::fill_slots(category, slots, count, min_live, diagnostics)
}

/// A shared HTTP client with a bounded per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("daily-byte/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { inner })
    }

    /// GET `url` and decode a JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self.inner.get(url).send().await?.error_for_status()?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Malformed(e.to_string()))
    }

    /// GET `url` and return the body as trimmed text.
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.inner.get(url).send().await?.error_for_status()?;
        let text = response.text().await?;
        Ok(text.trim().to_string())
    }
}

/// Build one adapter per category from configuration.
pub fn default_sources(config: &Config) -> Result<Vec<Arc<dyn ContentSource>>, FetchError> {
    let http = HttpClient::new(config.request_timeout())?;
    let Endpoints {
        quote_primary,
        quote_secondary,
        joke,
        trivia,
        history,
        random_word,
        dictionary,
    } = config.endpoints.clone();

    Ok(vec![
        Arc::new(QuoteSource::new(http.clone(), quote_primary, quote_secondary)),
        Arc::new(JokeSource::new(http.clone(), joke)),
        Arc::new(TriviaSource::new(http.clone(), trivia, config.min_trivia_successes)),
        Arc::new(HistorySource::new(http.clone(), history)),
        Arc::new(WordSource::new(http, random_word, dictionary)),
    ])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
