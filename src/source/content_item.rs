//! The core data types shared across all content providers.
//!
//! `ContentItem` is a single displayable entry from any provider.  Every
//! adapter converts its native payload into `ContentItem`s so the rest of the
//! application (cache, rotation, rendering) can stay provider-agnostic.
//!
//! ## For contributors
//!
//! Adding a sixth category means adding a [`Category`] variant, a matching
//! [`ContentItem`] variant, a fallback list in `fallback.rs` and an adapter.
//! [`Category::ALL`] drives completeness checks, so the cache will treat
//! previously stored sets as incomplete until they contain the new category.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the five content kinds shown on the panel.
///
/// The declaration order is the display order and the index into
/// [`crate::rotation::RotationState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Quote,
    Joke,
    Trivia,
    History,
    Word,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Quote,
        Category::Joke,
        Category::Trivia,
        Category::History,
        Category::Word,
    ];

    /// Position of this category in [`Category::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Quote => "quote",
            Category::Joke => "joke",
            Category::Trivia => "trivia",
            Category::History => "history",
            Category::Word => "word",
        }
    }

    /// Card heading used by the terminal panel.
    pub fn title(self) -> &'static str {
        match self {
            Category::Quote => "Quote",
            Category::Joke => "Joke",
            Category::Trivia => "Trivia",
            Category::History => "On This Day",
            Category::Word => "Word of the Day",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single displayable entry, normalised from any provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    Quote {
        text: String,
        author: String,
    },
    Joke {
        setup: String,
        /// Single-line jokes have no punchline.
        punchline: Option<String>,
    },
    Trivia {
        text: String,
    },
    HistoryFact {
        year: i32,
        text: String,
    },
    WordEntry {
        word: String,
        part_of_speech: String,
        definition: String,
    },
}

impl ContentItem {
    /// The category this variant belongs to.
    pub fn category(&self) -> Category {
        match self {
            ContentItem::Quote { .. } => Category::Quote,
            ContentItem::Joke { .. } => Category::Joke,
            ContentItem::Trivia { .. } => Category::Trivia,
            ContentItem::HistoryFact { .. } => Category::History,
            ContentItem::WordEntry { .. } => Category::Word,
        }
    }
}

/// How many of a category's items came from a live provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Provenance {
    pub live: usize,
    pub total: usize,
}

impl Provenance {
    pub fn fallback(&self) -> usize {
        self.total.saturating_sub(self.live)
    }

    pub fn is_live(&self) -> bool {
        self.live == self.total
    }
}

/// The fixed-length item list for one category.
///
/// Adapters always produce exactly `items_per_category` entries, all of the
/// category's variant; [`CategoryResult::is_valid`] checks both when a result
/// comes back from persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryResult {
    items: Vec<ContentItem>,
    /// Items that came from a live provider; the rest are bundled.
    #[serde(default)]
    live: usize,
}

impl CategoryResult {
    /// A result made entirely of bundled items.
    pub fn new(items: Vec<ContentItem>) -> Self {
        Self::with_live(items, 0)
    }

    pub fn with_live(items: Vec<ContentItem>, live: usize) -> Self {
        Self { items, live }
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn provenance(&self) -> Provenance {
        Provenance {
            live: self.live,
            total: self.len(),
        }
    }

    /// Item at `index`, wrapping so rotation can never index out of bounds.
    pub fn get_wrapped(&self, index: usize) -> Option<&ContentItem> {
        let items = self.items();
        if items.is_empty() {
            return None;
        }
        items.get(index % items.len())
    }

    pub fn is_valid(&self, category: Category, expected_len: usize) -> bool {
        self.len() == expected_len
            && self.live <= expected_len
            && self.items().iter().all(|item| item.category() == category)
    }
}

/// The full bundle of all categories' current results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentSet(BTreeMap<Category, CategoryResult>);

impl ContentSet {
    pub fn insert(&mut self, category: Category, result: CategoryResult) {
        self.0.insert(category, result);
    }

    pub fn get(&self, category: Category) -> Option<&CategoryResult> {
        self.0.get(&category)
    }

    /// Whether every category is present with exactly `items_per_category`
    /// items of the right variant.  Only complete sets are cacheable.
    pub fn is_complete(&self, items_per_category: usize) -> bool {
        Category::ALL.iter().all(|&category| {
            self.get(category)
                .is_some_and(|result| result.is_valid(category, items_per_category))
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
