//! Quote provider.
//!
//! One batched request to the primary provider; if that yields no usable
//! quotes the secondary provider is asked instead.  Whatever is still missing
//! is padded from the bundled list by [`super::fetch_category`].

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{fallback, Category, ContentItem, ContentSource, FetchError, HttpClient, SlotOutcome};
use crate::diagnostics::{Diagnostics, Level};

/// Primary payload shape: `[{"content": "...", "author": "..."}]`.
#[derive(Debug, Deserialize)]
struct PrimaryQuote {
    #[serde(default)]
    content: String,
    author: Option<String>,
}

/// Secondary payload shape: `[{"q": "...", "a": "..."}]`.
#[derive(Debug, Deserialize)]
struct SecondaryQuote {
    #[serde(default)]
    q: String,
    a: Option<String>,
}

pub struct QuoteSource {
    http: HttpClient,
    primary_url: String,
    secondary_url: String,
}

impl QuoteSource {
    pub fn new(http: HttpClient, primary_url: String, secondary_url: String) -> Self {
        Self {
            http,
            primary_url,
            secondary_url,
        }
    }

    fn normalise(text: String, author: Option<String>) -> Option<ContentItem> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(ContentItem::Quote {
            text: text.to_string(),
            author: author
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
        })
    }

    async fn fetch_primary(&self, count: usize) -> Result<Vec<ContentItem>, FetchError> {
        let url = format!("{}?limit={count}", self.primary_url);
        let quotes: Vec<PrimaryQuote> = self.http.get_json(&url).await?;
        let items: Vec<ContentItem> = quotes
            .into_iter()
            .filter_map(|q| Self::normalise(q.content, q.author))
            .collect();
        if items.is_empty() {
            return Err(FetchError::Malformed("no usable quotes".into()));
        }
        Ok(items)
    }

    async fn fetch_secondary(&self, count: usize) -> Result<Vec<ContentItem>, FetchError> {
        let quotes: Vec<SecondaryQuote> = self.http.get_json(&self.secondary_url).await?;
        let items: Vec<ContentItem> = quotes
            .into_iter()
            .take(count)
            .filter_map(|q| Self::normalise(q.q, q.a))
            .collect();
        if items.is_empty() {
            return Err(FetchError::Malformed("no usable quotes".into()));
        }
        Ok(items)
    }
}

#[async_trait]
impl ContentSource for QuoteSource {
    fn category(&self) -> Category {
        Category::Quote
    }

    async fn fetch_slots(&self, count: usize, diagnostics: &dyn Diagnostics) -> Vec<SlotOutcome> {
        let batch = match self.fetch_primary(count).await {
            Ok(items) => Ok(items),
            Err(primary_error) => {
                diagnostics.log(
                    Level::Warning,
                    &fallback::source_name(Category::Quote),
                    "quote primary provider failed, trying secondary",
                    json!({ "error": primary_error.to_string() }),
                );
                self.fetch_secondary(count).await
            }
        };
        fallback::batch_slots(Category::Quote, batch, diagnostics)
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

    fn source(server: &MockServer) -> QuoteSource {
        QuoteSource::new(
            HttpClient::new(Duration::from_secs(5)).unwrap(),
            server.url("/primary"),
            server.url("/secondary"),
        )
    }

    #[tokio::test]
    async fn uses_primary_batch() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/primary").query_param("limit", "2");
                then.status(200).header("content-type", "application/json").body(
                    r#"[{"content":"First","author":"A"},{"content":"Second","author":null}]"#,
                );
            })
            .await;

        let diag = RecordingDiagnostics::default();
        let result = fetch_category(&source(&server), 2, &diag).await;

        assert_eq!(
            result.items()[0],
            ContentItem::Quote {
                text: "First".into(),
                author: "A".into()
            }
        );
        assert_eq!(
            result.items()[1],
            ContentItem::Quote {
                text: "Second".into(),
                author: "Unknown".into()
            }
        );
        assert!(diag.events().is_empty());
    }

    #[tokio::test]
    async fn falls_back_to_secondary_then_pads() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/primary");
                then.status(503);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/secondary");
                then.status(200)
                    .body(r#"[{"q":"Zen one","a":"Z"},{"q":"","a":"empty"}]"#);
            })
            .await;

        let diag = RecordingDiagnostics::default();
        let result = fetch_category(&source(&server), 5, &diag).await;

        assert_eq!(result.len(), 5);
        assert_eq!(
            result.items()[0],
            ContentItem::Quote {
                text: "Zen one".into(),
                author: "Z".into()
            }
        );
        assert_eq!(result.items()[1], fallback::item(Category::Quote, 1));
        assert_eq!(diag.matching("trying secondary").len(), 1);
        assert_eq!(diag.matching("fallback substituted for 4 of 5").len(), 1);
    }

    #[tokio::test]
    async fn both_providers_down_yields_bundled_quotes() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(500);
            })
            .await;

        let diag = RecordingDiagnostics::default();
        let result = fetch_category(&source(&server), 5, &diag).await;

        assert_eq!(result.items(), fallback::items(Category::Quote, 5).as_slice());
        assert_eq!(diag.matching("quote request failed")[0].level, Level::Error);
    }
}
