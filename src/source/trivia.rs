//! Trivia provider.
//!
//! The provider returns one plain-text fact per request, so `count` requests
//! are issued concurrently.  Live results are only used when at least
//! `min_successes` of them came back; otherwise the category is served
//! entirely from the bundled list.

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::json;

use super::{fallback, Category, ContentItem, ContentSource, FetchError, HttpClient, SlotOutcome};
use crate::diagnostics::{Diagnostics, Level};

pub struct TriviaSource {
    http: HttpClient,
    url: String,
    min_successes: usize,
}

impl TriviaSource {
    pub fn new(http: HttpClient, url: String, min_successes: usize) -> Self {
        Self {
            http,
            url,
            min_successes,
        }
    }

    async fn fetch_one(&self) -> SlotOutcome {
        let text = self.http.get_text(&self.url).await?;
        if text.is_empty() {
            return Err(FetchError::Malformed("empty trivia body".into()));
        }
        Ok(ContentItem::Trivia { text })
    }
}

#[async_trait]
impl ContentSource for TriviaSource {
    fn category(&self) -> Category {
        Category::Trivia
    }

    fn min_live(&self, _count: usize) -> usize {
        self.min_successes
    }

    async fn fetch_slots(&self, count: usize, diagnostics: &dyn Diagnostics) -> Vec<SlotOutcome> {
        let slots = join_all((0..count).map(|_| self.fetch_one())).await;

        let failed: Vec<String> = slots
            .iter()
            .filter_map(|slot| slot.as_ref().err().map(ToString::to_string))
            .collect();
        if !failed.is_empty() {
            diagnostics.log(
                Level::Error,
                &fallback::source_name(Category::Trivia),
                &format!("{} of {count} trivia requests failed", failed.len()),
                json!({ "errors": failed }),
            );
        }
        slots
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use httpmock::prelude::*;

    use super::*;
    use crate::diagnostics::RecordingDiagnostics;
    use crate::source::fetch_category;

    fn source(url: String) -> TriviaSource {
        TriviaSource::new(HttpClient::new(Duration::from_secs(5)).unwrap(), url, 3)
    }

    #[tokio::test]
    async fn all_requests_succeed() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/random/trivia");
                then.status(200).body("42 is the answer.\n");
            })
            .await;

        let diag = RecordingDiagnostics::default();
        let result = fetch_category(&source(server.url("/random/trivia")), 5, &diag).await;

        assert_eq!(mock.hits_async().await, 5);
        assert!(result
            .items()
            .iter()
            .all(|i| *i == ContentItem::Trivia { text: "42 is the answer.".into() }));
        assert!(diag.events().is_empty());
    }

    #[tokio::test]
    async fn empty_bodies_fall_back_entirely() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/random/trivia");
                then.status(200).body("   ");
            })
            .await;

        let diag = RecordingDiagnostics::default();
        let result = fetch_category(&source(server.url("/random/trivia")), 5, &diag).await;

        assert_eq!(result.items(), fallback::items(Category::Trivia, 5).as_slice());
        assert_eq!(diag.matching("mostly failed").len(), 1);
        assert_eq!(diag.matching("5 of 5 trivia requests failed").len(), 1);
    }

    #[tokio::test]
    async fn unreachable_provider_still_yields_full_result() {
        let diag = RecordingDiagnostics::default();
        // Port 9 (discard) is closed on test hosts, so every request fails fast.
        let result = fetch_category(&source("http://127.0.0.1:9/trivia".into()), 5, &diag).await;

        assert_eq!(result.len(), 5);
        assert_eq!(result.items(), fallback::items(Category::Trivia, 5).as_slice());
    }

    #[tokio::test]
    async fn hung_provider_times_out_into_fallback() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/random/trivia");
                then.status(200)
                    .body("too late")
                    .delay(Duration::from_secs(5));
            })
            .await;

        let client = HttpClient::new(Duration::from_millis(300)).unwrap();
        let trivia = TriviaSource::new(client, server.url("/random/trivia"), 3);
        let diag = RecordingDiagnostics::default();

        let started = std::time::Instant::now();
        let result = fetch_category(&trivia, 5, &diag).await;
        let elapsed = started.elapsed();

        assert!(elapsed < Duration::from_secs(2), "took {elapsed:?}");
        assert_eq!(result.items(), fallback::items(Category::Trivia, 5).as_slice());
        assert_eq!(result.provenance().live, 0);

        let failed = diag.matching("5 of 5 trivia requests failed");
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].details["errors"][0], "request timed out");
    }
}
