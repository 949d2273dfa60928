//! # districache-cache
//!
//! Worker-local LRU+TTL cache engine (spec §4.1). Each worker process owns
//! exactly one [`LruCache`]; there is no sharding here because concurrency
//! across workers is already provided by running one process per node — the
//! per-process cache only needs to survive concurrent access from many
//! in-flight router RPCs.
//!
//! ## Design Principles
//!
//! 1. **Index-based Intrusive LRU**: entries live in a dense `Vec<Option<Node>>`
//!    arena linked by index (not heap pointers), avoiding unsafe pointer
//!    links while keeping the hot path cache-friendly, sized to an
//!    entry-count budget rather than a byte budget.
//! 2. **TTL is a Soft Boundary**: expiry is checked lazily on `get` and swept
//!    periodically by `cleanup_expired`; a `get` that races the sweeper may
//!    observe expiry slightly early, never late.
//! 3. **Single Lock**: one `parking_lot::RwLock` guards map, arena, and
//!    counters together, since a single worker's cache is not the
//!    contention bottleneck the way a multi-tenant in-process engine would be.

mod sweeper;

use std::sync::Arc;
use std::time::{Duration, Instant};

use ahash::RandomState;
use hashbrown::HashMap;
use parking_lot::RwLock;

use districache_common::{CacheStats, Error, KeyWithTtl, Result};

pub use sweeper::SweeperHandle;

#[derive(Debug)]
struct Node {
    key: Arc<str>,
    value: Arc<str>,
    expires_at: Option<Instant>,
    prev: Option<usize>,
    next: Option<usize>,
}

impl Node {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(deadline) if now >= deadline)
    }
}

#[derive(Debug)]
struct Inner {
    map: HashMap<Arc<str>, usize, RandomState>,
    nodes: Vec<Option<Node>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    hits: u64,
    misses: u64,
}

impl Inner {
    fn new() -> Self {
        Inner {
            map: HashMap::with_hasher(RandomState::new()),
            nodes: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            hits: 0,
            misses: 0,
        }
    }

    fn lru_remove(&mut self, idx: usize) {
        let (prev, next) = {
            let node = self.nodes[idx].as_ref().expect("node exists");
            (node.prev, node.next)
        };
        match prev {
            Some(p) => self.nodes[p].as_mut().unwrap().next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].as_mut().unwrap().prev = prev,
            None => self.tail = prev,
        }
        let node = self.nodes[idx].as_mut().unwrap();
        node.prev = None;
        node.next = None;
    }

    fn lru_push_back(&mut self, idx: usize) {
        let tail = self.tail;
        {
            let node = self.nodes[idx].as_mut().unwrap();
            node.prev = tail;
            node.next = None;
        }
        match tail {
            Some(t) => self.nodes[t].as_mut().unwrap().next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
    }

    fn touch(&mut self, idx: usize) {
        if self.tail == Some(idx) {
            return;
        }
        self.lru_remove(idx);
        self.lru_push_back(idx);
    }

    fn insert_new(&mut self, key: Arc<str>, value: Arc<str>, expires_at: Option<Instant>) -> usize {
        let idx = self.free.pop().unwrap_or_else(|| {
            self.nodes.push(None);
            self.nodes.len() - 1
        });
        self.nodes[idx] = Some(Node {
            key: Arc::clone(&key),
            value,
            expires_at,
            prev: None,
            next: None,
        });
        self.lru_push_back(idx);
        self.map.insert(key, idx);
        idx
    }

    fn remove_idx(&mut self, idx: usize) {
        if let Some(node) = self.nodes[idx].take() {
            self.lru_remove(idx);
            self.map.remove(node.key.as_ref());
            self.free.push(idx);
        }
    }

    fn pop_lru(&mut self) {
        if let Some(idx) = self.head {
            self.remove_idx(idx);
        }
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}

/// A capacity-bounded, TTL-aware LRU cache (spec §4.1).
pub struct LruCache {
    capacity: usize,
    inner: RwLock<Inner>,
}

impl LruCache {
    /// Creates a cache bounded to `capacity` entries.
    ///
    /// Fails with [`Error::InvalidArgument`] when `capacity == 0`.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidArgument("capacity must be greater than zero".into()));
        }
        Ok(LruCache {
            capacity,
            inner: RwLock::new(Inner::new()),
        })
    }

    /// Looks up `key`. On a hit, promotes the entry to most-recent and
    /// increments `hits`. On a miss — absent or expired — increments
    /// `misses`; an expired entry is removed before returning `None`.
    pub fn get(&self, key: &str) -> Option<Arc<str>> {
        let now = Instant::now();
        let mut inner = self.inner.write();

        let idx = match inner.map.get(key) {
            Some(&idx) => idx,
            None => {
                inner.misses += 1;
                return None;
            }
        };

        let expired = inner.nodes[idx].as_ref().map(|n| n.is_expired(now)).unwrap_or(true);
        if expired {
            inner.remove_idx(idx);
            inner.misses += 1;
            return None;
        }

        inner.hits += 1;
        inner.touch(idx);
        inner.nodes[idx].as_ref().map(|n| Arc::clone(&n.value))
    }

    /// Inserts or replaces `key`. If the key already exists its prior entry
    /// is removed first, so the replacement becomes most-recent without
    /// double-counting capacity. If at capacity, evicts the least-recent
    /// entry before inserting.
    pub fn put(&self, key: &str, value: &str, ttl: Option<Duration>) {
        let expires_at = ttl.map(|d| Instant::now() + d);
        let mut inner = self.inner.write();

        if let Some(&idx) = inner.map.get(key) {
            inner.remove_idx(idx);
        } else if inner.len() == self.capacity {
            inner.pop_lru();
        }

        let key_arc: Arc<str> = Arc::from(key);
        let value_arc: Arc<str> = Arc::from(value);
        inner.insert_new(key_arc, value_arc, expires_at);
    }

    /// Removes `key` if present. Returns whether it existed. Idempotent.
    pub fn delete(&self, key: &str) -> bool {
        let mut inner = self.inner.write();
        match inner.map.get(key).copied() {
            Some(idx) => {
                inner.remove_idx(idx);
                true
            }
            None => false,
        }
    }

    /// Empties all entries and resets `hits`/`misses` to zero.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        *inner = Inner::new();
    }

    /// Current entry count. Entries that have expired but not yet been
    /// swept are still counted, matching spec §9's chosen resolution.
    pub fn size(&self) -> usize {
        self.inner.read().len()
    }

    /// Hit/miss counters and derived hit rate.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.read();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            hit_rate: CacheStats::hit_rate(inner.hits, inner.misses),
            current_size: inner.len(),
            capacity: self.capacity,
        }
    }

    /// Snapshot of every live (non-expired) entry, without affecting
    /// recency order. `ttl_remaining` is rounded to one decimal place;
    /// `None` for entries with no TTL.
    pub fn list_with_ttl(&self) -> Vec<KeyWithTtl> {
        let now = Instant::now();
        let inner = self.inner.read();
        inner
            .nodes
            .iter()
            .flatten()
            .filter(|node| !node.is_expired(now))
            .map(|node| KeyWithTtl {
                key: node.key.to_string(),
                value: node.value.to_string(),
                ttl_remaining: node.expires_at.map(|deadline| {
                    let remaining = deadline.saturating_duration_since(now).as_secs_f64();
                    (remaining.max(0.0) * 10.0).round() / 10.0
                }),
            })
            .collect()
    }

    /// Scans all entries and drops those whose TTL has elapsed. Returns the
    /// number removed. Safe to call concurrently with other operations.
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.inner.write();
        let expired: Vec<usize> = inner
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().filter(|n| n.is_expired(now)).map(|_| idx))
            .collect();
        let count = expired.len();
        for idx in expired {
            inner.remove_idx(idx);
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_zero_capacity() {
        assert!(LruCache::new(0).is_err());
    }

    #[test]
    fn get_on_empty_cache_is_a_miss() {
        let cache = LruCache::new(2).unwrap();
        assert_eq!(cache.get("missing"), None);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn put_then_get_is_a_hit() {
        let cache = LruCache::new(2).unwrap();
        cache.put("a", "1", None);
        assert_eq!(cache.get("a").as_deref(), Some("1"));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn capacity_one_evicts_previous_entry() {
        let cache = LruCache::new(1).unwrap();
        cache.put("a", "1", None);
        cache.put("b", "2", None);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b").as_deref(), Some("2"));
    }

    #[test]
    fn n_plus_one_inserts_evict_least_recent() {
        let cache = LruCache::new(3).unwrap();
        cache.put("a", "1", None);
        cache.put("b", "2", None);
        cache.put("c", "3", None);
        // touch "a" so "b" becomes least-recent
        cache.get("a");
        cache.put("d", "4", None);
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.size(), 3);
    }

    #[test]
    fn put_on_existing_key_refreshes_recency_without_growing() {
        let cache = LruCache::new(2).unwrap();
        cache.put("a", "1", None);
        cache.put("b", "2", None);
        cache.put("a", "1-updated", None);
        cache.put("c", "3", None);
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("a").as_deref(), Some("1-updated"));
        assert_eq!(cache.size(), 2);
    }

    #[test]
    fn delete_is_idempotent() {
        let cache = LruCache::new(2).unwrap();
        cache.put("a", "1", None);
        assert!(cache.delete("a"));
        assert!(!cache.delete("a"));
    }

    #[test]
    fn clear_resets_counters() {
        let cache = LruCache::new(2).unwrap();
        cache.put("a", "1", None);
        cache.get("a");
        cache.get("missing");
        cache.clear();
        let stats = cache.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.current_size, 0);
    }

    #[test]
    fn expired_entry_is_a_miss_and_is_removed() {
        let cache = LruCache::new(2).unwrap();
        cache.put("a", "1", Some(Duration::from_millis(1)));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn list_with_ttl_skips_expired_and_keeps_recency() {
        let cache = LruCache::new(3).unwrap();
        cache.put("a", "1", Some(Duration::from_millis(1)));
        cache.put("b", "2", None);
        std::thread::sleep(Duration::from_millis(20));
        let listing = cache.list_with_ttl();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].key, "b");
        assert_eq!(listing[0].ttl_remaining, None);
    }

    #[test]
    fn list_with_ttl_does_not_promote_recency() {
        let cache = LruCache::new(2).unwrap();
        cache.put("a", "1", None);
        cache.put("b", "2", None);
        let _ = cache.list_with_ttl();
        cache.put("c", "3", None);
        // "a" was least-recent and list_with_ttl should not have saved it
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn cleanup_expired_counts_and_removes() {
        let cache = LruCache::new(3).unwrap();
        cache.put("a", "1", Some(Duration::from_millis(1)));
        cache.put("b", "2", None);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.cleanup_expired(), 1);
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn stats_hit_rate_reflects_mixed_traffic() {
        let cache = LruCache::new(2).unwrap();
        cache.put("a", "1", None);
        cache.get("a");
        cache.get("a");
        cache.get("missing");
        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate, 66.67);
    }
}
