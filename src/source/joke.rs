//! Joke provider.
//!
//! Asks for `count` safe-mode jokes in one request.  The provider answers a
//! single joke as a bare object and several as `{"jokes": [...]}`; both are
//! accepted.

use async_trait::async_trait;
use serde::Deserialize;

use super::{fallback, Category, ContentItem, ContentSource, FetchError, HttpClient, SlotOutcome};
use crate::diagnostics::Diagnostics;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RawJoke {
    Single { joke: String },
    Twopart { setup: String, delivery: String },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JokePayload {
    Many { jokes: Vec<RawJoke> },
    One(RawJoke),
}

impl From<RawJoke> for ContentItem {
    fn from(raw: RawJoke) -> Self {
        match raw {
            RawJoke::Single { joke } => ContentItem::Joke {
                setup: joke,
                punchline: None,
            },
            RawJoke::Twopart { setup, delivery } => ContentItem::Joke {
                setup,
                punchline: Some(delivery),
            },
        }
    }
}

pub struct JokeSource {
    http: HttpClient,
    url: String,
}

impl JokeSource {
    pub fn new(http: HttpClient, url: String) -> Self {
        Self { http, url }
    }

    async fn fetch_batch(&self, count: usize) -> Result<Vec<ContentItem>, FetchError> {
        let url = format!("{}?safe-mode&amount={count}", self.url);
        let payload: JokePayload = self.http.get_json(&url).await?;
        let raw = match payload {
            JokePayload::Many { jokes } => jokes,
            JokePayload::One(joke) => vec![joke],
        };
        Ok(raw
            .into_iter()
            .map(ContentItem::from)
            .filter(|item| matches!(item, ContentItem::Joke { setup, .. } if !setup.trim().is_empty()))
            .collect())
    }
}

#[async_trait]
impl ContentSource for JokeSource {
    fn category(&self) -> Category {
        Category::Joke
    }

    async fn fetch_slots(&self, count: usize, diagnostics: &dyn Diagnostics) -> Vec<SlotOutcome> {
        let batch = self.fetch_batch(count).await;
        fallback::batch_slots(Category::Joke, batch, diagnostics)
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

    fn source(server: &MockServer) -> JokeSource {
        JokeSource::new(
            HttpClient::new(Duration::from_secs(5)).unwrap(),
            server.url("/joke/Any"),
        )
    }

    #[tokio::test]
    async fn parses_mixed_joke_batch() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/joke/Any").query_param("amount", "2");
                then.status(200).body(
                    r#"{"error":false,"amount":2,"jokes":[
                        {"type":"twopart","setup":"Knock knock","delivery":"Who's there?","id":1},
                        {"type":"single","joke":"A one-liner.","id":2}
                    ]}"#,
                );
            })
            .await;

        let diag = RecordingDiagnostics::default();
        let result = fetch_category(&source(&server), 2, &diag).await;

        assert_eq!(
            result.items()[0],
            ContentItem::Joke {
                setup: "Knock knock".into(),
                punchline: Some("Who's there?".into())
            }
        );
        assert_eq!(
            result.items()[1],
            ContentItem::Joke {
                setup: "A one-liner.".into(),
                punchline: None
            }
        );
        assert!(diag.events().is_empty());
    }

    #[tokio::test]
    async fn single_object_payload_is_padded() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/joke/Any");
                then.status(200)
                    .body(r#"{"type":"single","joke":"Only one.","id":9}"#);
            })
            .await;

        let diag = RecordingDiagnostics::default();
        let result = fetch_category(&source(&server), 3, &diag).await;

        assert_eq!(result.len(), 3);
        assert_eq!(result.items()[2], fallback::item(Category::Joke, 2));
        assert_eq!(diag.matching("fallback substituted for 2 of 3").len(), 1);
    }

    #[tokio::test]
    async fn malformed_payload_falls_back_entirely() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/joke/Any");
                then.status(200).body(r#"{"error":true,"message":"No matching joke found"}"#);
            })
            .await;

        let diag = RecordingDiagnostics::default();
        let result = fetch_category(&source(&server), 5, &diag).await;

        assert_eq!(result.items(), fallback::items(Category::Joke, 5).as_slice());
        assert_eq!(diag.matching("joke request failed").len(), 1);
    }
}
