//! Read-through response cache
//!
//! One process-wide key/entry map in front of the admin API. Entries
//! carry a TTL class; a stale entry is deleted on read, not just
//! skipped, so the map never accumulates dead data on hot keys.
//!
//! The clock is injected so tests can move time without sleeping.

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared::util::now_millis;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Millisecond clock, injectable for tests.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        now_millis()
    }
}

/// Manually advanced clock for tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start: i64) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    pub fn advance_millis(&self, delta: i64) {
        self.now.fetch_add(delta, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, delta: i64) {
        self.advance_millis(delta * 1_000);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// TTL class per resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlClass {
    /// Order listings and detail (5 min)
    Orders,
    /// Checker listings (10 min)
    Checkers,
    /// Inventory report (2 min)
    Inventory,
    /// Dashboard stats (1 min)
    Stats,
}

impl TtlClass {
    pub fn ttl_millis(&self) -> i64 {
        match self {
            TtlClass::Orders => 5 * 60 * 1_000,
            TtlClass::Checkers => 10 * 60 * 1_000,
            TtlClass::Inventory => 2 * 60 * 1_000,
            TtlClass::Stats => 60 * 1_000,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    data: serde_json::Value,
    inserted_at: i64,
    ttl: i64,
}

/// Process-wide response cache.
///
/// Values are stored as JSON so one map can hold every resource type,
/// and are always replaced wholesale, never partially updated.
pub struct CacheService {
    entries: DashMap<String, CacheEntry>,
    clock: Arc<dyn Clock>,
}

impl CacheService {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Fetch a live entry, deleting it if stale.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let now = self.clock.now_millis();
        let entry = self.entries.get(key)?;
        if now - entry.inserted_at >= entry.ttl {
            drop(entry);
            self.entries.remove(key);
            tracing::debug!(key, "cache entry expired");
            return None;
        }
        serde_json::from_value(entry.data.clone()).ok()
    }

    /// Store a fresh entry under the given TTL class.
    pub fn insert<T: Serialize>(&self, key: &str, value: &T, class: TtlClass) {
        let data = match serde_json::to_value(value) {
            Ok(data) => data,
            Err(err) => {
                tracing::warn!(key, %err, "value not cacheable");
                return;
            }
        };
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                data,
                inserted_at: self.clock.now_millis(),
                ttl: class.ttl_millis(),
            },
        );
    }

    /// Remove every key whose name contains the pattern.
    pub fn invalidate(&self, pattern: &str) {
        self.entries.retain(|key, _| !key.contains(pattern));
        tracing::debug!(pattern, "cache invalidated");
    }

    /// Drop everything (logout, 401).
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CacheService {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> (Arc<ManualClock>, CacheService) {
        let clock = Arc::new(ManualClock::new(0));
        let cache = CacheService::new(clock.clone());
        (clock, cache)
    }

    #[test]
    fn test_hit_within_ttl_expiry_at_boundary() {
        let (clock, cache) = service();
        cache.insert("inventory", &42u32, TtlClass::Inventory);

        clock.advance_secs(119);
        assert_eq!(cache.get::<u32>("inventory"), Some(42));

        clock.advance_secs(2); // t = 121s, TTL = 120s
        assert_eq!(cache.get::<u32>("inventory"), None);
        // Stale entry was deleted on read, not just ignored
        assert!(cache.is_empty());
    }

    #[test]
    fn test_exact_ttl_boundary_is_stale() {
        let (clock, cache) = service();
        cache.insert("stats", &1u32, TtlClass::Stats);
        clock.advance_secs(60);
        // now - inserted_at >= ttl means stale
        assert_eq!(cache.get::<u32>("stats"), None);
    }

    #[test]
    fn test_distinct_filter_keys_do_not_collide() {
        let (_, cache) = service();
        cache.insert("orders:status=paid", &vec!["a"], TtlClass::Orders);
        cache.insert("orders:status=pending", &vec!["b"], TtlClass::Orders);

        assert_eq!(
            cache.get::<Vec<String>>("orders:status=paid"),
            Some(vec!["a".to_string()])
        );
        assert_eq!(
            cache.get::<Vec<String>>("orders:status=pending"),
            Some(vec!["b".to_string()])
        );
    }

    #[test]
    fn test_pattern_invalidation() {
        let (_, cache) = service();
        cache.insert("orders:all", &1u32, TtlClass::Orders);
        cache.insert("orders:detail:o1", &2u32, TtlClass::Orders);
        cache.insert("inventory", &3u32, TtlClass::Inventory);

        cache.invalidate("orders");
        assert!(cache.get::<u32>("orders:all").is_none());
        assert!(cache.get::<u32>("orders:detail:o1").is_none());
        assert_eq!(cache.get::<u32>("inventory"), Some(3));
    }

    #[test]
    fn test_replace_is_wholesale() {
        let (clock, cache) = service();
        cache.insert("stats", &1u32, TtlClass::Stats);
        clock.advance_secs(59);
        cache.insert("stats", &2u32, TtlClass::Stats);
        clock.advance_secs(59);
        // Timestamp was reset by the replacement
        assert_eq!(cache.get::<u32>("stats"), Some(2));
    }
}
