//! # Plan Cache
//!
//! Bounded LRU map from a normalized statement key to its parsed AST. A hit
//! hands out a clone of the `Arc<Statement>`, so callers share the tree
//! read-only.
//!
//! ## Locking
//!
//! ```text
//! get_or_parse(sql)
//!   has_literals(sql) -> parse(sql), return    no lock, nothing cached
//!   key = normalize(sql)                       no lock
//!   lock { lookup + promote }                  critical section 1
//!   miss -> parse(sql)                         no lock
//!   lock { re-check, insert, evict oldest }    critical section 2
//! ```
//!
//! Parsing never runs under the mutex. Two threads missing on the same key
//! may both parse; the second insert finds the entry and returns the
//! already-cached tree, so every caller sees one AST per key.
//!
//! ## Recency
//!
//! Every access stamps the entry with a monotonically increasing tick. The
//! `recency` map orders ticks, so its first entry is always the least recently
//! used key and eviction is `O(log n)`.
//!
//! ## Literals
//!
//! Literals normalize to `?`, so `WHERE id = 1`, `WHERE id = 2` and
//! `WHERE id = ?` would all share a key. Statements carrying a literal are
//! therefore never cached: they are parsed fresh on every call, leave the
//! hit and miss counters untouched, and a cached placeholder tree is never
//! handed back for them.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use eyre::Result;
use hashbrown::HashMap;
use parking_lot::Mutex;

use super::ast::Statement;
use super::normalize::{has_literals, normalize};
use super::parser::parse;
use crate::config::{DEFAULT_PLAN_CACHE_CAPACITY, MIN_PLAN_CACHE_CAPACITY};

#[derive(Debug)]
struct CacheEntry {
    stmt: Arc<Statement>,
    tick: u64,
}

#[derive(Debug)]
struct LruCache {
    entries: HashMap<String, CacheEntry>,
    recency: BTreeMap<u64, String>,
    tick: u64,
    capacity: usize,
}

impl LruCache {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity.min(DEFAULT_PLAN_CACHE_CAPACITY)),
            recency: BTreeMap::new(),
            tick: 0,
            capacity,
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn get(&mut self, key: &str) -> Option<Arc<Statement>> {
        let tick = self.next_tick();
        let entry = self.entries.get_mut(key)?;
        self.recency.remove(&entry.tick);
        entry.tick = tick;
        self.recency.insert(tick, key.to_string());
        Some(Arc::clone(&entry.stmt))
    }

    /// Inserts `stmt` unless the key is already present, in which case the
    /// cached tree wins. Returns the tree now stored under `key`.
    fn insert(&mut self, key: String, stmt: Arc<Statement>) -> Arc<Statement> {
        if let Some(existing) = self.get(&key) {
            return existing;
        }

        while self.entries.len() >= self.capacity {
            let Some((_, oldest)) = self.recency.pop_first() else {
                break;
            };
            self.entries.remove(&oldest);
            tracing::debug!(key = %oldest, "plan cache evict");
        }

        let tick = self.next_tick();
        self.recency.insert(tick, key.clone());
        self.entries.insert(
            key,
            CacheEntry {
                stmt: Arc::clone(&stmt),
                tick,
            },
        );
        stmt
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }
}

/// Hit and miss counters since construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug)]
pub struct PlanCache {
    inner: Mutex<LruCache>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for PlanCache {
    fn default() -> Self {
        Self::new(DEFAULT_PLAN_CACHE_CAPACITY)
    }
}

impl PlanCache {
    /// Capacities below `MIN_PLAN_CACHE_CAPACITY` are raised to it.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LruCache::new(capacity.max(MIN_PLAN_CACHE_CAPACITY))),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the cached tree for `sql`, parsing and caching it on a miss.
    /// Literal-bearing SQL is parsed without touching the cache.
    pub fn get_or_parse(&self, sql: &str) -> Result<Arc<Statement>> {
        if has_literals(sql) {
            return Ok(Arc::new(parse(sql)?));
        }
        let key = normalize(sql);

        if let Some(stmt) = self.inner.lock().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(key = %key, "plan cache hit");
            return Ok(stmt);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(key = %key, "plan cache miss");

        let stmt = Arc::new(parse(sql)?);
        Ok(self.inner.lock().insert(key, stmt))
    }

    /// Looks up `sql` by its normalized key and promotes the entry on a hit.
    /// Literal-bearing SQL never hits.
    pub fn get(&self, sql: &str) -> Option<Arc<Statement>> {
        if has_literals(sql) {
            return None;
        }
        let key = normalize(sql);
        self.inner.lock().get(&key)
    }

    /// Stores an already-parsed statement under the key of `sql`. An existing
    /// entry for the key is kept and returned. Literal-bearing SQL is handed
    /// back uncached.
    pub fn insert(&self, sql: &str, stmt: Statement) -> Arc<Statement> {
        if has_literals(sql) {
            return Arc::new(stmt);
        }
        let key = normalize(sql);
        self.inner.lock().insert(key, Arc::new(stmt))
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
