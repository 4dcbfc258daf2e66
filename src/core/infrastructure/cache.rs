use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::core::model::{normalize_field, LyricsResult, ProviderId, Query, TimingMode};

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Identity of a cached lookup. Artist and title are compared
/// case- and whitespace-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    artist: String,
    title: String,
    timing: TimingMode,
    sequence: Option<Vec<ProviderId>>,
}

impl CacheKey {
    pub fn for_query(query: &Query) -> Self {
        Self {
            artist: normalize_field(query.artist()),
            title: normalize_field(query.title()),
            timing: query.timing(),
            sequence: query.sequence_override().map(<[ProviderId]>::to_vec),
        }
    }
}

struct CacheEntry {
    result: Arc<LyricsResult>,
    expires_at: Instant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub entry_count: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate_percent: f64,
}

/// In-memory TTL cache of successful lookups.
pub struct LyricsCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
    default_ttl: Duration,
    max_entries: usize,
}

impl Default for LyricsCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_MAX_ENTRIES)
    }
}

impl LyricsCache {
    pub fn new(default_ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            default_ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// A live entry counts as a hit. Missing or expired entries count as a
    /// miss; expired ones are dropped on the way out.
    pub fn lookup(&self, key: &CacheKey) -> Option<Arc<LyricsResult>> {
        let now = Instant::now();
        let expired = {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    debug!("Cache hit for: {} - {}", key.artist, key.title);
                    return Some(Arc::clone(&entry.result));
                }
                Some(_) => true,
                None => false,
            }
        };

        if expired {
            let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
            if entries.get(key).is_some_and(|e| e.expires_at <= now) {
                entries.remove(key);
            }
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!("Cache miss for: {} - {}", key.artist, key.title);
        None
    }

    pub fn store(&self, key: CacheKey, result: Arc<LyricsResult>, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key,
            CacheEntry {
                result,
                expires_at: now + ttl,
            },
        );

        if entries.len() > self.max_entries {
            entries.retain(|_, e| e.expires_at > now);
        }
        if entries.len() > self.max_entries {
            let overflow = entries.len() - self.max_entries;
            let mut by_expiry: Vec<(CacheKey, Instant)> =
                entries.iter().map(|(k, e)| (k.clone(), e.expires_at)).collect();
            by_expiry.sort_by_key(|(_, expires_at)| *expires_at);
            for (key, _) in by_expiry.into_iter().take(overflow) {
                entries.remove(&key);
            }
            debug!("Cache over capacity, evicted {} entries", overflow);
        }
    }

    pub fn store_default(&self, key: CacheKey, result: Arc<LyricsResult>) {
        self.store(key, result, self.default_ttl);
    }

    /// Drop every entry, returning how many there were. Counters are kept.
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let count = entries.len();
        entries.clear();
        info!("Cache cleared ({} entries)", count);
        count
    }

    pub fn stats(&self) -> CacheStats {
        let entry_count = self.entries.read().unwrap_or_else(|e| e.into_inner()).len();
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate_percent = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        CacheStats {
            entry_count,
            hits,
            misses,
            hit_rate_percent,
        }
    }

    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, e| e.expires_at > now);
        let removed = before - entries.len();
        if removed > 0 {
            debug!("Purged {} expired cache entries", removed);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Lyrics;
    use chrono::Utc;

    fn result(text: &str) -> Arc<LyricsResult> {
        Arc::new(LyricsResult {
            source: ProviderId::Lrclib,
            artist: "Adele".to_string(),
            title: "Hello".to_string(),
            lyrics: Lyrics::Plain(text.to_string()),
            attempts: Vec::new(),
            retrieved_at: Utc::now(),
        })
    }

    fn key(artist: &str, title: &str) -> CacheKey {
        CacheKey::for_query(&Query::new(artist, title).unwrap())
    }

    #[tokio::test]
    async fn test_hit_and_miss_counters() {
        let cache = LyricsCache::default();
        assert!(cache.lookup(&key("Adele", "Hello")).is_none());

        cache.store_default(key("Adele", "Hello"), result("x"));
        let before = cache.stats();
        let hit = cache.lookup(&key("  ADELE ", "hello")).unwrap();
        assert_eq!(hit.lyrics.plain_text(), "x");

        let after = cache.stats();
        assert_eq!(after.hits, before.hits + 1);
        assert_eq!(after.misses, 1);
        assert_eq!(after.entry_count, 1);
        assert_eq!(after.hit_rate_percent, 50.0);
    }

    #[tokio::test]
    async fn test_key_separates_timing_and_sequence() {
        let cache = LyricsCache::default();
        cache.store_default(key("Adele", "Hello"), result("plain"));

        let timed = CacheKey::for_query(&Query::new("Adele", "Hello").unwrap().with_timing(TimingMode::Preferred));
        assert!(cache.lookup(&timed).is_none());
        let custom = CacheKey::for_query(
            &Query::new("Adele", "Hello").unwrap().with_sequence(vec![ProviderId::Genius]),
        );
        assert!(cache.lookup(&custom).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire() {
        let cache = LyricsCache::new(Duration::from_secs(300), 10);
        cache.store_default(key("Adele", "Hello"), result("x"));
        cache.store(key("Adele", "Skyfall"), result("y"), Duration::from_secs(900));

        tokio::time::advance(Duration::from_secs(301)).await;
        assert!(cache.lookup(&key("Adele", "Hello")).is_none());
        assert_eq!(cache.stats().entry_count, 1);
        assert!(cache.lookup(&key("Adele", "Skyfall")).is_some());

        tokio::time::advance(Duration::from_secs(600)).await;
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.stats().entry_count, 0);
    }

    #[tokio::test]
    async fn test_clear_returns_count_and_later_lookups_miss() {
        let cache = LyricsCache::default();
        cache.store_default(key("A", "1"), result("1"));
        cache.store_default(key("A", "2"), result("2"));

        assert_eq!(cache.clear(), 2);
        let misses = cache.stats().misses;
        assert!(cache.lookup(&key("A", "1")).is_none());
        assert_eq!(cache.stats().misses, misses + 1);
        assert_eq!(cache.clear(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_evicts_soonest_expiring() {
        let cache = LyricsCache::new(Duration::from_secs(300), 2);
        cache.store(key("A", "short"), result("1"), Duration::from_secs(10));
        cache.store(key("A", "long"), result("2"), Duration::from_secs(1000));
        cache.store(key("A", "mid"), result("3"), Duration::from_secs(500));

        assert_eq!(cache.stats().entry_count, 2);
        assert!(cache.lookup(&key("A", "short")).is_none());
        assert!(cache.lookup(&key("A", "long")).is_some());
        assert!(cache.lookup(&key("A", "mid")).is_some());
    }
}
