use jiff::{SignedDuration, Timestamp};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::models::FeedResult;
use super::store::KeyValueStore;

pub const CACHE_KEY: &str = "headlinesCache";
pub const CACHE_TIME_KEY: &str = "headlinesCacheTime";

/// Headline cache with a time-to-live, layered over a [`KeyValueStore`].
///
/// There is exactly one entry: the payload of the last completed fetch cycle
/// and the epoch-millisecond time it was saved. Saving always overwrites.
///
/// Like the in-memory caches elsewhere, metrics are opt-in: with
/// `enable_metrics` every access emits a `tracing::debug!` with elapsed time
/// and hit/miss.
#[derive(Clone)]
pub struct CacheStore {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
    enable_metrics: bool,
}

impl CacheStore {
    pub fn new(store: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self::with_metrics(store, ttl, false)
    }

    pub fn with_metrics(store: Arc<dyn KeyValueStore>, ttl: Duration, enable_metrics: bool) -> Self {
        Self {
            store,
            ttl,
            enable_metrics,
        }
    }

    /// When the current entry was saved, if there is one with a readable time.
    pub fn saved_at(&self) -> Option<Timestamp> {
        let raw = self.store.get(CACHE_TIME_KEY)?;
        let millis = raw.trim().parse::<i64>().ok()?;
        Timestamp::from_millisecond(millis).ok()
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Timestamp::now())
    }

    /// True iff a save time exists and `now - saved_at < ttl`.
    pub fn is_valid_at(&self, now: Timestamp) -> bool {
        let start = Instant::now();
        let valid = match self.saved_at() {
            Some(saved_at) => {
                let age = now.duration_since(saved_at);
                let ttl = SignedDuration::try_from(self.ttl).unwrap_or(SignedDuration::MAX);
                age < ttl
            }
            None => false,
        };
        if self.enable_metrics {
            tracing::debug!(elapsed = ?start.elapsed(), valid, "cache.is_valid");
        }
        valid
    }

    /// The cached payload, or `None` when missing or unreadable.
    pub fn load(&self) -> Option<Vec<FeedResult>> {
        let start = Instant::now();
        let raw = self.store.get(CACHE_KEY);
        let payload = raw.and_then(|raw| match serde_json::from_str::<Vec<FeedResult>>(&raw) {
            Ok(payload) => Some(payload),
            Err(e) => {
                tracing::warn!("Error parsing cache, treating as miss: {}", e);
                None
            }
        });
        if self.enable_metrics {
            tracing::debug!(elapsed = ?start.elapsed(), hit = payload.is_some(), "cache.load");
        }
        payload
    }

    pub fn save(&self, payload: &[FeedResult]) {
        self.save_at(payload, Timestamp::now());
    }

    /// Store `payload` with `now` as its save time. Write failures are logged;
    /// the next fetch cycle simply tries again.
    pub fn save_at(&self, payload: &[FeedResult], now: Timestamp) {
        let start = Instant::now();
        let json = match serde_json::to_string(payload) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to serialize headlines cache: {}", e);
                return;
            }
        };

        let result = self
            .store
            .set(CACHE_KEY, &json)
            .and_then(|_| self.store.set(CACHE_TIME_KEY, &now.as_millisecond().to_string()));

        match result {
            Ok(()) => {
                if self.enable_metrics {
                    tracing::debug!(elapsed = ?start.elapsed(), sources = payload.len(), "cache.save");
                }
            }
            Err(e) => tracing::error!("Failed to write headlines cache: {:#}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::models::{FeedSource, HeadlineItem};
    use crate::internal::store::MemoryStore;

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    fn sample_payload() -> Vec<FeedResult> {
        vec![
            FeedResult {
                feed: FeedSource::new("El Diario", "https://www.eldiario.es/rss"),
                items: vec![HeadlineItem {
                    title: "Primera".to_string(),
                    link: "https://www.eldiario.es/a".to_string(),
                    pub_date: ts("2025-03-01T08:30:00Z"),
                }],
            },
            FeedResult {
                feed: FeedSource::new("ABC", "https://www.abc.es/rss/2.0/portada/"),
                items: vec![],
            },
        ]
    }

    fn cache_with_store() -> (CacheStore, MemoryStore) {
        let store = MemoryStore::new();
        let cache = CacheStore::new(Arc::new(store.clone()), Duration::from_secs(600));
        (cache, store)
    }

    #[test]
    fn empty_cache_is_invalid_and_misses() {
        let (cache, _) = cache_with_store();
        assert!(!cache.is_valid_at(ts("2025-03-01T09:00:00Z")));
        assert_eq!(cache.load(), None);
    }

    #[test]
    fn validity_window_is_ten_minutes() {
        let (cache, _) = cache_with_store();
        let saved = ts("2025-03-01T09:00:00Z");
        cache.save_at(&sample_payload(), saved);

        assert!(cache.is_valid_at(ts("2025-03-01T09:09:59Z")));
        assert!(!cache.is_valid_at(ts("2025-03-01T09:10:01Z")));
        assert!(!cache.is_valid_at(ts("2025-03-01T09:10:00Z")));
    }

    #[test]
    fn save_then_load_round_trips() {
        let (cache, _) = cache_with_store();
        let payload = sample_payload();
        cache.save_at(&payload, ts("2025-03-01T09:00:00Z"));
        assert_eq!(cache.load(), Some(payload));
    }

    #[test]
    fn save_overwrites_previous_entry() {
        let (cache, _) = cache_with_store();
        cache.save_at(&sample_payload(), ts("2025-03-01T09:00:00Z"));
        cache.save_at(&[], ts("2025-03-01T09:30:00Z"));

        assert_eq!(cache.load(), Some(vec![]));
        assert_eq!(cache.saved_at(), Some(ts("2025-03-01T09:30:00Z")));
    }

    #[test]
    fn save_time_is_epoch_millis_string() {
        let (cache, store) = cache_with_store();
        cache.save_at(&[], ts("2023-11-14T22:13:20Z"));
        assert_eq!(
            store.get(CACHE_TIME_KEY).as_deref(),
            Some("1700000000000")
        );
    }

    #[test]
    fn malformed_payload_is_a_miss() {
        let (cache, store) = cache_with_store();
        store.set(CACHE_KEY, "[{\"feed\":").unwrap();
        assert_eq!(cache.load(), None);
    }

    #[test]
    fn malformed_time_is_invalid() {
        let (cache, store) = cache_with_store();
        store.set(CACHE_TIME_KEY, "yesterday").unwrap();
        assert!(!cache.is_valid_at(ts("2025-03-01T09:00:00Z")));
    }
}
