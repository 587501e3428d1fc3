//! Word-of-the-day provider.
//!
//! Each slot is an independent two-step round trip: fetch a random word, then
//! look up its definition.  Either step failing short-circuits that slot to
//! its positional fallback entry.  No step is retried.

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;

use super::{fallback, Category, ContentItem, ContentSource, FetchError, HttpClient, SlotOutcome};
use crate::diagnostics::{Diagnostics, Level};

#[derive(Debug, Deserialize)]
struct DictionaryEntry {
    word: String,
    #[serde(default)]
    meanings: Vec<Meaning>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Meaning {
    part_of_speech: String,
    #[serde(default)]
    definitions: Vec<Definition>,
}

#[derive(Debug, Deserialize)]
struct Definition {
    definition: String,
}

/// First meaning that carries a definition.
fn first_definition(entries: Vec<DictionaryEntry>) -> Option<ContentItem> {
    entries.into_iter().find_map(|entry| {
        let word = entry.word;
        entry.meanings.into_iter().find_map(|meaning| {
            let definition = meaning.definitions.into_iter().next()?.definition;
            Some(ContentItem::WordEntry {
                word: word.clone(),
                part_of_speech: meaning.part_of_speech,
                definition,
            })
        })
    })
}

/// `{base}/{word}` with `word` percent-encoded as a single path segment.
fn definition_url(base: &str, word: &str) -> Result<Url, FetchError> {
    let mut url =
        Url::parse(base).map_err(|e| FetchError::Malformed(format!("dictionary URL: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| FetchError::Malformed(format!("dictionary URL cannot take a path: {base}")))?
        .pop_if_empty()
        .push(word);
    Ok(url)
}

pub struct WordSource {
    http: HttpClient,
    random_word_url: String,
    dictionary_url: String,
}

impl WordSource {
    pub fn new(http: HttpClient, random_word_url: String, dictionary_url: String) -> Self {
        Self {
            http,
            random_word_url,
            dictionary_url,
        }
    }

    async fn random_word(&self) -> Result<String, FetchError> {
        let words: Vec<String> = self.http.get_json(&self.random_word_url).await?;
        words
            .into_iter()
            .map(|w| w.trim().to_string())
            .find(|w| !w.is_empty())
            .ok_or_else(|| FetchError::Malformed("random word list was empty".into()))
    }

    async fn define(&self, word: &str) -> SlotOutcome {
        let url = definition_url(&self.dictionary_url, word)?;
        let entries: Vec<DictionaryEntry> = self.http.get_json(url.as_str()).await?;
        first_definition(entries)
            .ok_or_else(|| FetchError::Malformed(format!("no definition for {word:?}")))
    }

    async fn fetch_one(&self) -> SlotOutcome {
        let word = self.random_word().await?;
        self.define(&word).await
    }
}

#[async_trait]
impl ContentSource for WordSource {
    fn category(&self) -> Category {
        Category::Word
    }

    async fn fetch_slots(&self, count: usize, diagnostics: &dyn Diagnostics) -> Vec<SlotOutcome> {
        let slots = join_all((0..count).map(|_| self.fetch_one())).await;

        let failed: Vec<_> = slots
            .iter()
            .enumerate()
            .filter_map(|(slot, outcome)| {
                outcome
                    .as_ref()
                    .err()
                    .map(|e| json!({ "slot": slot, "error": e.to_string() }))
            })
            .collect();
        if !failed.is_empty() {
            diagnostics.log(
                Level::Error,
                &fallback::source_name(Category::Word),
                &format!("{} of {count} word lookups failed", failed.len()),
                json!({ "failures": failed }),
            );
        }
        slots
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
