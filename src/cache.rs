//! Content cache with a time-to-live.
//!
//! The in-memory entry is authoritative for the session; the key-value store
//! behind it is best effort.  The persisted entry is loaded once, when the
//! cache is built, so every reader sees it from the first call on.  A store
//! that cannot be read counts as a cache miss, and a store that cannot be
//! written is skipped, each with one diagnostic, so the service keeps working
//! from memory.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::clock::Clock;
use crate::diagnostics::{Diagnostics, Level};
use crate::lock::{rw_read, rw_write};
use crate::source::ContentSet;
use crate::store::{KeyValueStore, StoreError};

/// Fixed key of the persisted entry.
pub const CACHE_KEY: &str = "dailyByteData";

const SOURCE: &str = "daily_byte.cache";

/// A content set together with when it was fetched.  Never mutated; a newer
/// entry replaces it.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub content: Arc<ContentSet>,
    pub fetched_at: DateTime<Utc>,
}

/// Persisted shape: `{"data": ..., "timestamp": <unix millis>}`.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    data: ContentSet,
    timestamp: i64,
}

pub struct CacheStore {
    backing: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    diagnostics: Arc<dyn Diagnostics>,
    ttl: Duration,
    current: RwLock<Option<Arc<CacheEntry>>>,
}

impl CacheStore {
    /// Build the cache and load whatever valid entry the store holds.  This
    /// reads the backing store synchronously, so call it during startup.
    pub fn new(
        backing: Box<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        diagnostics: Arc<dyn Diagnostics>,
        ttl: std::time::Duration,
        items_per_category: usize,
    ) -> Self {
        let backing: Arc<dyn KeyValueStore> = Arc::from(backing);
        let current = match load(backing.as_ref(), diagnostics.as_ref(), items_per_category) {
            Ok(Some(entry)) => {
                tracing::debug!(fetched_at = %entry.fetched_at, "loaded persisted content");
                Some(Arc::new(entry))
            }
            Ok(None) => None,
            Err(e) => {
                diagnostics.log(
                    Level::Error,
                    SOURCE,
                    "cache read failed, treating as miss",
                    json!({ "key": CACHE_KEY, "error": e.to_string() }),
                );
                None
            }
        };

        Self {
            backing,
            clock,
            diagnostics,
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::days(365 * 100)),
            current: RwLock::new(current),
        }
    }

    /// The stored entry if it is complete and younger than the TTL.
    pub fn read(&self) -> Option<Arc<CacheEntry>> {
        let entry = self.latest()?;
        if self.clock.now() - entry.fetched_at < self.ttl {
            Some(entry)
        } else {
            None
        }
    }

    /// The most recent entry regardless of age.  Stale content is still
    /// displayable while a refresh is pending.
    pub fn latest(&self) -> Option<Arc<CacheEntry>> {
        rw_read(&self.current, "cache.latest").clone()
    }

    /// Store `content` as the current entry, then try to persist it on the
    /// blocking pool.
    pub async fn write(&self, content: ContentSet) -> Arc<CacheEntry> {
        let entry = Arc::new(CacheEntry {
            content: Arc::new(content),
            fetched_at: self.clock.now(),
        });
        *rw_write(&self.current, "cache.write") = Some(Arc::clone(&entry));

        if let Err(e) = self.persist(&entry).await {
            self.diagnostics.log(
                Level::Error,
                SOURCE,
                "cache write failed, continuing in memory",
                json!({ "key": CACHE_KEY, "error": e.to_string() }),
            );
        }
        entry
    }

    /// Drop the current entry and its persisted copy, forcing the next read
    /// to miss.
    pub fn clear(&self) {
        *rw_write(&self.current, "cache.clear") = None;
        if let Err(e) = self.backing.remove(CACHE_KEY) {
            self.diagnostics.log(
                Level::Error,
                SOURCE,
                "cache clear failed",
                json!({ "key": CACHE_KEY, "error": e.to_string() }),
            );
        }
    }

    async fn persist(&self, entry: &CacheEntry) -> Result<(), StoreError> {
        let envelope = Envelope {
            data: (*entry.content).clone(),
            timestamp: entry.fetched_at.timestamp_millis(),
        };
        let value = serde_json::to_string(&envelope)?;
        let backing = Arc::clone(&self.backing);
        tokio::task::spawn_blocking(move || backing.set(CACHE_KEY, &value))
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
    }
}

fn load(
    backing: &dyn KeyValueStore,
    diagnostics: &dyn Diagnostics,
    items_per_category: usize,
) -> Result<Option<CacheEntry>, StoreError> {
    let Some(raw) = backing.get(CACHE_KEY)? else {
        return Ok(None);
    };
    let envelope: Envelope = serde_json::from_str(&raw)?;
    if !envelope.data.is_complete(items_per_category) {
        diagnostics.log(
            Level::Warning,
            SOURCE,
            "discarding incomplete cached content",
            json!({ "key": CACHE_KEY }),
        );
        return Ok(None);
    }
    let Some(fetched_at) = Utc.timestamp_millis_opt(envelope.timestamp).single() else {
        return Ok(None);
    };
    Ok(Some(CacheEntry {
        content: Arc::new(envelope.data),
        fetched_at,
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::diagnostics::RecordingDiagnostics;
    use crate::source::{fallback, Category, CategoryResult};
    use crate::store::MemoryStore;

    /// A backing store that fails every operation.
    pub(crate) struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("disk on fire".into()))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("quota exceeded".into()))
        }

        fn remove(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("disk on fire".into()))
        }
    }

    pub(crate) fn fallback_set(n: usize) -> ContentSet {
        let mut set = ContentSet::default();
        for category in Category::ALL {
            set.insert(category, CategoryResult::new(fallback::items(category, n)));
        }
        set
    }

    fn cache(
        backing: Box<dyn KeyValueStore>,
        clock: Arc<ManualClock>,
        diag: Arc<RecordingDiagnostics>,
    ) -> CacheStore {
        CacheStore::new(
            backing,
            clock,
            diag,
            std::time::Duration::from_secs(6 * 60 * 60),
            5,
        )
    }

    #[test]
    fn empty_cache_misses() {
        let c = cache(
            Box::new(MemoryStore::default()),
            Arc::new(ManualClock::new()),
            Arc::default(),
        );
        assert!(c.read().is_none());
        assert!(c.latest().is_none());
    }

    #[tokio::test]
    async fn entry_expires_after_ttl() {
        let clock = Arc::new(ManualClock::new());
        let c = cache(Box::new(MemoryStore::default()), clock.clone(), Arc::default());
        c.write(fallback_set(5)).await;

        clock.advance(Duration::hours(5) + Duration::minutes(59));
        assert!(c.read().is_some());

        clock.advance(Duration::minutes(2));
        assert!(c.read().is_none());
        assert!(c.latest().is_some(), "stale entry is still displayable");
    }

    #[tokio::test]
    async fn persisted_entry_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new());

        let first = cache(
            Box::new(crate::store::FileStore::new(dir.path())),
            clock.clone(),
            Arc::default(),
        );
        let written = first.write(fallback_set(5)).await;

        clock.advance(Duration::hours(1));
        let second = cache(
            Box::new(crate::store::FileStore::new(dir.path())),
            clock,
            Arc::default(),
        );
        let read = second.read().expect("persisted entry should be fresh");
        assert_eq!(read.content, written.content);
        assert_eq!(
            read.fetched_at.timestamp_millis(),
            written.fetched_at.timestamp_millis()
        );
    }

    #[tokio::test]
    async fn persisted_envelope_shape() {
        let store = Arc::new(MemoryStore::default());
        let c = cache(
            Box::new(SharedStore(store.clone())),
            Arc::new(ManualClock::new()),
            Arc::default(),
        );
        let entry = c.write(fallback_set(5)).await;

        let raw = store.get(CACHE_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["timestamp"], entry.fetched_at.timestamp_millis());
        assert!(value["data"]["trivia"]["items"].is_array());
    }

    #[test]
    fn incomplete_persisted_entry_is_a_miss() {
        let store = MemoryStore::default();
        let mut partial = fallback_set(5);
        partial.insert(Category::Word, CategoryResult::new(vec![]));
        let clock = Arc::new(ManualClock::new());
        let envelope = Envelope {
            data: partial,
            timestamp: clock.now().timestamp_millis(),
        };
        store
            .set(CACHE_KEY, &serde_json::to_string(&envelope).unwrap())
            .unwrap();

        let diag = Arc::new(RecordingDiagnostics::default());
        let c = cache(Box::new(store), clock, diag.clone());
        assert!(c.read().is_none());
        assert_eq!(diag.matching("incomplete").len(), 1);
    }

    #[test]
    fn corrupt_persisted_entry_is_a_miss() {
        let store = MemoryStore::default();
        store.set(CACHE_KEY, "{not json").unwrap();

        let diag = Arc::new(RecordingDiagnostics::default());
        let c = cache(Box::new(store), Arc::new(ManualClock::new()), diag.clone());
        assert!(c.read().is_none());
        assert!(c.read().is_none());
        assert_eq!(diag.matching("cache read failed").len(), 1, "reported once");
    }

    #[tokio::test]
    async fn broken_store_degrades_to_memory() {
        let diag = Arc::new(RecordingDiagnostics::default());
        let c = cache(Box::new(BrokenStore), Arc::new(ManualClock::new()), diag.clone());

        assert!(c.read().is_none());
        assert_eq!(diag.matching("cache read failed").len(), 1, "reported when built");
        c.write(fallback_set(5)).await;
        assert!(c.read().is_some(), "memory entry serves the session");

        assert_eq!(diag.matching("cache read failed").len(), 1);
        assert_eq!(diag.matching("cache write failed").len(), 1);
        assert!(diag.events().iter().all(|e| e.level == Level::Error));
    }

    #[tokio::test]
    async fn clear_removes_memory_and_persisted_entry() {
        let store = Arc::new(MemoryStore::default());
        let c = cache(
            Box::new(SharedStore(store.clone())),
            Arc::new(ManualClock::new()),
            Arc::default(),
        );
        c.write(fallback_set(5)).await;
        c.clear();

        assert!(c.read().is_none());
        assert!(c.latest().is_none());
        assert!(store.get(CACHE_KEY).unwrap().is_none());
    }

    #[test]
    fn persisted_entry_is_available_without_a_read() {
        let store = MemoryStore::default();
        let clock = Arc::new(ManualClock::new());
        let envelope = Envelope {
            data: fallback_set(5),
            timestamp: clock.now().timestamp_millis(),
        };
        store
            .set(CACHE_KEY, &serde_json::to_string(&envelope).unwrap())
            .unwrap();

        let c = cache(Box::new(store), clock, Arc::default());
        let latest = c.latest().expect("loaded when built");
        assert_eq!(*latest.content, fallback_set(5));
    }

    /// Lets a test keep a handle on the store the cache writes to.
    struct SharedStore(Arc<MemoryStore>);

    impl KeyValueStore for SharedStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.0.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            self.0.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StoreError> {
            self.0.remove(key)
        }
    }
}
