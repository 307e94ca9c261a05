use log::{debug, info};
use shared::CacheStats;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::cache::clock::{Clock, SystemClock};
use crate::cache::models::CacheEntry;

/// In-memory memoization store with absolute expiry.
///
/// Reads never refresh an entry's lifetime. Expired entries are dropped lazily
/// by `get`; there is no background sweep.
#[derive(Clone)]
pub struct FingerprintCache<V> {
    entries: Arc<Mutex<HashMap<String, CacheEntry<V>>>>,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> FingerprintCache<V> {
    pub fn new(default_ttl: Duration) -> Self {
        Self::with_clock(default_ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            default_ttl,
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.lock();

        let expired = match entries.get(key) {
            Some(entry) => entry.is_expired(now),
            None => return None,
        };

        if expired {
            if let Some(entry) = entries.remove(key) {
                info!("Cache expired for key: {}...", short_key(&entry.key));
            }
            return None;
        }

        debug!("Cache hit for key: {}...", short_key(key));
        entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn set(&self, key: String, value: V, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.default_ttl);
        let expires_at = self.clock.now() + ttl;
        info!(
            "Cached data for key: {}... (TTL: {}s)",
            short_key(&key),
            ttl.as_secs()
        );
        let entry = CacheEntry::new(key.clone(), value, expires_at);
        self.lock().insert(key, entry);
    }

    pub fn clear(&self) {
        self.lock().clear();
        info!("Cache cleared");
    }

    /// Counts expired entries without evicting them.
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let entries = self.lock();
        let total_items = entries.len();
        let expired_items = entries
            .values()
            .filter(|entry| entry.is_expired(now))
            .count();
        CacheStats {
            total_items,
            active_items: total_items - expired_items,
            expired_items,
        }
    }
}

fn short_key(key: &str) -> String {
    key.chars().take(10).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::clock::ManualClock;

    fn cache_with_clock(ttl: Duration) -> (FingerprintCache<String>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (FingerprintCache::with_clock(ttl, clock.clone()), clock)
    }

    #[test]
    fn entry_is_served_until_its_ttl_elapses() {
        let (cache, clock) = cache_with_clock(Duration::from_secs(600));
        cache.set("k".into(), "v".into(), Some(Duration::from_secs(10)));

        clock.advance(Duration::from_secs(9));
        assert_eq!(cache.get("k").as_deref(), Some("v"));

        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.stats().total_items, 0, "expired entry is purged on read");
    }

    #[test]
    fn expiry_boundary_holds_for_many_ttls() {
        for ttl in [1u64, 2, 7, 60, 3600] {
            for probe in [0, ttl / 2, ttl - 1, ttl, ttl + 1, ttl * 3] {
                let (cache, clock) = cache_with_clock(Duration::from_secs(600));
                cache.set("k".into(), "v".into(), Some(Duration::from_secs(ttl)));
                clock.advance(Duration::from_secs(probe));
                assert_eq!(cache.get("k").is_some(), probe < ttl, "ttl={} probe={}", ttl, probe);
            }
        }
    }

    #[test]
    fn default_ttl_applies_without_override() {
        let (cache, clock) = cache_with_clock(Duration::from_secs(30));
        cache.set("k".into(), "v".into(), None);
        clock.advance(Duration::from_secs(29));
        assert!(cache.get("k").is_some());
        clock.advance(Duration::from_secs(1));
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn reads_do_not_refresh_expiry() {
        let (cache, clock) = cache_with_clock(Duration::from_secs(10));
        cache.set("k".into(), "v".into(), None);
        for _ in 0..9 {
            clock.advance(Duration::from_secs(1));
            assert!(cache.get("k").is_some());
        }
        clock.advance(Duration::from_secs(1));
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn distinct_keys_are_isolated() {
        let (cache, _clock) = cache_with_clock(Duration::from_secs(60));
        cache.set("k1".into(), "v1".into(), None);
        cache.set("k2".into(), "v2".into(), None);
        assert_eq!(cache.get("k1").as_deref(), Some("v1"));
        assert_eq!(cache.get("k2").as_deref(), Some("v2"));
    }

    #[test]
    fn set_overwrites_and_resets_expiry() {
        let (cache, clock) = cache_with_clock(Duration::from_secs(10));
        cache.set("k".into(), "old".into(), None);
        clock.advance(Duration::from_secs(8));
        cache.set("k".into(), "new".into(), None);
        clock.advance(Duration::from_secs(8));
        assert_eq!(cache.get("k").as_deref(), Some("new"));
        assert_eq!(cache.stats().total_items, 1);
    }

    #[test]
    fn stats_count_expired_without_evicting() {
        let (cache, clock) = cache_with_clock(Duration::from_secs(60));
        cache.set("short".into(), "a".into(), Some(Duration::from_secs(5)));
        cache.set("long".into(), "b".into(), Some(Duration::from_secs(50)));
        clock.advance(Duration::from_secs(10));

        let expected = CacheStats {
            total_items: 2,
            active_items: 1,
            expired_items: 1,
        };
        assert_eq!(cache.stats(), expected);
        assert_eq!(cache.stats(), expected, "stats is read-only");
    }

    #[test]
    fn clear_empties_the_store() {
        let (cache, _clock) = cache_with_clock(Duration::from_secs(60));
        cache.set("a".into(), "1".into(), None);
        cache.set("b".into(), "2".into(), None);
        cache.clear();
        assert_eq!(cache.stats(), CacheStats::default());
        assert!(cache.get("a").is_none());
    }

    #[test]
    fn clones_share_storage() {
        let (cache, _clock) = cache_with_clock(Duration::from_secs(60));
        let other = cache.clone();
        other.set("k".into(), "v".into(), None);
        assert_eq!(cache.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn concurrent_writers_leave_one_live_entry_per_key() {
        let (cache, _clock) = cache_with_clock(Duration::from_secs(60));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for j in 0..100 {
                        cache.set(format!("key-{}", j % 10), format!("{}-{}", i, j), None);
                        let _ = cache.get(&format!("key-{}", (j + 3) % 10));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.stats().total_items, 10);
    }
}
