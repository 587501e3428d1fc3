//! Statically bundled fallback content and the shared padding helper.
//!
//! Every category ships five offline items.  When a live fetch fails or comes
//! back short, the missing slot `i` is filled with fallback entry
//! `i % FALLBACK_LEN` so that a category result is always complete.

use serde_json::json;

use super::{Category, CategoryResult, ContentItem, FetchError};
use crate::diagnostics::{Diagnostics, Level};

/// Number of bundled items per category.
pub const FALLBACK_LEN: usize = 5;

const QUOTES: [(&str, &str); FALLBACK_LEN] = [
    ("The only way to do great work is to love what you do.", "Steve Jobs"),
    ("In the middle of difficulty lies opportunity.", "Albert Einstein"),
    ("The best way to predict the future is to create it.", "Peter Drucker"),
    ("Be the change that you want to see in the world.", "Mahatma Gandhi"),
    ("Through discipline comes freedom.", "Aristotle"),
];

const JOKES: [(&str, Option<&str>); FALLBACK_LEN] = [
    ("Why do programmers prefer dark mode?", Some("Because light attracts bugs!")),
    ("Why did the sysadmin break up with the server?", Some("It had too many issues.")),
    ("There are 10 kinds of people: those who understand binary and those who don't.", None),
    ("How many programmers does it take to change a light bulb?", Some("None, that's a hardware problem.")),
    ("Why was the homelab so cold?", Some("Someone left all the Windows open.")),
];

const TRIVIA: [&str; FALLBACK_LEN] = [
    "The first computer bug was an actual bug: a moth found in a Harvard computer in 1947.",
    "A group of flamingos is called a flamboyance.",
    "Honey found in ancient Egyptian tombs was still edible.",
    "Octopuses have three hearts.",
    "The Eiffel Tower can be around 15 cm taller in summer due to thermal expansion.",
];

const HISTORY: [(i32, &str); FALLBACK_LEN] = [
    (1969, "Apollo 11 lands on the Moon."),
    (1989, "Tim Berners-Lee proposes the World Wide Web at CERN."),
    (1971, "The first email is sent over ARPANET."),
    (1991, "Linus Torvalds announces the Linux kernel."),
    (1947, "The transistor is demonstrated at Bell Labs."),
];

const WORDS: [(&str, &str, &str); FALLBACK_LEN] = [
    ("serendipity", "noun", "The occurrence of events by chance in a happy or beneficial way."),
    ("ephemeral", "adjective", "Lasting for a very short time."),
    ("ubiquitous", "adjective", "Present, appearing, or found everywhere."),
    ("petrichor", "noun", "A pleasant smell that accompanies the first rain after dry weather."),
    ("sonder", "noun", "The realization that each passerby has a life as vivid as your own."),
];

/// The bundled fallback item for `category` at `position`, wrapping past the
/// end of the bundled list.
pub fn item(category: Category, position: usize) -> ContentItem {
    let i = position % FALLBACK_LEN;
    match category {
        Category::Quote => ContentItem::Quote {
            text: QUOTES[i].0.to_string(),
            author: QUOTES[i].1.to_string(),
        },
        Category::Joke => ContentItem::Joke {
            setup: JOKES[i].0.to_string(),
            punchline: JOKES[i].1.map(String::from),
        },
        Category::Trivia => ContentItem::Trivia {
            text: TRIVIA[i].to_string(),
        },
        Category::History => ContentItem::HistoryFact {
            year: HISTORY[i].0,
            text: HISTORY[i].1.to_string(),
        },
        Category::Word => ContentItem::WordEntry {
            word: WORDS[i].0.to_string(),
            part_of_speech: WORDS[i].1.to_string(),
            definition: WORDS[i].2.to_string(),
        },
    }
}

/// The first `count` fallback items for `category`.
pub fn items(category: Category, count: usize) -> Vec<ContentItem> {
    (0..count).map(|i| item(category, i)).collect()
}

/// Outcome of fetching a single slot.
pub type SlotOutcome = Result<ContentItem, FetchError>;

/// Turn per-slot outcomes into a complete [`CategoryResult`].
///
/// `slots` may be shorter than `count` (a short batch); missing slots count
/// as [`FetchError::ShortPayload`].  If fewer than `min_live` slots succeeded
/// the whole category is replaced with fallback content and an extra
/// "mostly failed" diagnostic is emitted.  A single warning lists every
/// substituted slot.
pub fn fill_slots(
    category: Category,
    slots: Vec<SlotOutcome>,
    count: usize,
    min_live: usize,
    diagnostics: &dyn Diagnostics,
) -> CategoryResult {
    let source = source_name(category);
    let mut slots: Vec<SlotOutcome> = slots.into_iter().take(count).collect();
    let received = slots.len();
    slots.extend((received..count).map(|_| {
        Err(FetchError::ShortPayload {
            expected: count,
            received,
        })
    }));

    let live = slots.iter().filter(|slot| slot.is_ok()).count();
    let discard_live = live < min_live;
    if discard_live {
        diagnostics.log(
            Level::Error,
            &source,
            &format!("{category} fetch mostly failed, using bundled content"),
            json!({ "category": category, "live": live, "required": min_live, "count": count }),
        );
    }

    let mut substituted = Vec::new();
    let items: Vec<ContentItem> = slots
        .into_iter()
        .enumerate()
        .map(|(position, slot)| {
            let reason = match slot {
                Ok(live_item) if !discard_live && live_item.category() == category => {
                    return live_item
                }
                Ok(_) if discard_live => "below live threshold".to_string(),
                Ok(_) => "wrong item variant".to_string(),
                Err(e) => e.to_string(),
            };
            substituted.push(json!({ "slot": position, "reason": reason }));
            item(category, position)
        })
        .collect();

    if !substituted.is_empty() {
        diagnostics.log(
            Level::Warning,
            &source,
            &format!("{category} fallback substituted for {} of {count} items", substituted.len()),
            json!({ "category": category, "substituted": substituted }),
        );
    }

    let live = items.len() - substituted.len();
    CategoryResult::with_live(items, live)
}

/// Convert the result of a single batched request into slot outcomes,
/// reporting the request failure itself as an error diagnostic.
pub fn batch_slots(
    category: Category,
    batch: Result<Vec<ContentItem>, FetchError>,
    diagnostics: &dyn Diagnostics,
) -> Vec<SlotOutcome> {
    match batch {
        Ok(items) => items.into_iter().map(Ok).collect(),
        Err(e) => {
            diagnostics.log(
                Level::Error,
                &source_name(category),
                &format!("{category} request failed"),
                json!({ "category": category, "error": e.to_string() }),
            );
            Vec::new()
        }
    }
}

pub(crate) fn source_name(category: Category) -> String {
    format!("daily_byte.{category}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
