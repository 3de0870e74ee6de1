//! # Report Cache
//!
//! Bounded in-process key → value store with per-entry TTL.
//!
//! ## Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  set("sales:2026-10-01..2026-10-16", report, 5 min)                     │
//! │       │                                                                 │
//! │       ├── key new and cache full? evict FIRST key in insertion order   │
//! │       │   (least recently inserted, not least recently used)           │
//! │       └── store (value, inserted_at = now, ttl), key moves to the end  │
//! │                                                                         │
//! │  get(key)                                                               │
//! │       ├── now - inserted_at <= ttl  → Some(value)                       │
//! │       └── otherwise                 → remove entry, None                │
//! │                                                                         │
//! │  sweep()   removes every expired entry, independent of reads           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cache is internally synchronised and meant to be shared through an
//! `Arc` in the server state. Every method has an `*_at(now)` twin taking
//! an explicit [`Instant`] so expiry can be tested without sleeping.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::{DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL_SECS};

struct Entry<V> {
    value: V,
    inserted_at: Instant,
    ttl: Duration,
}

impl<V> Entry<V> {
    fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) <= self.ttl
    }
}

struct Inner<V> {
    entries: HashMap<String, Entry<V>>,
    /// Keys in insertion order; front is evicted first.
    order: VecDeque<String>,
}

impl<V> Inner<V> {
    fn remove(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.order.retain(|k| k != key);
            true
        } else {
            false
        }
    }
}

/// Bounded TTL cache with insertion-order eviction.
pub struct ReportCache<V> {
    inner: Mutex<Inner<V>>,
    capacity: usize,
    default_ttl: Duration,
}

impl<V: Clone> ReportCache<V> {
    /// Creates a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity: capacity.max(1),
            default_ttl,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    // Lock poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, Inner<V>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// Returns a clone of the value if it is still fresh at `now`; an
    /// expired entry is removed.
    pub fn get_at(&self, key: &str, now: Instant) -> Option<V> {
        let mut inner = self.lock();

        match inner.entries.get(key) {
            Some(entry) if entry.is_fresh(now) => return Some(entry.value.clone()),
            Some(_) => {}
            None => return None,
        }

        inner.remove(key);
        None
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Stores `value` under `key` with the default TTL.
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_at(key, value, self.default_ttl, Instant::now());
    }

    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.set_at(key, value, ttl, Instant::now());
    }

    /// Stores `value` as inserted at `now`.
    ///
    /// A new key arriving at a full cache first evicts the oldest inserted
    /// key. Re-setting an existing key replaces its value and moves it to the
    /// back of the eviction order.
    pub fn set_at(&self, key: impl Into<String>, value: V, ttl: Duration, now: Instant) {
        let key = key.into();
        let mut inner = self.lock();

        if inner.entries.contains_key(&key) {
            inner.remove(&key);
        } else if inner.entries.len() >= self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
            }
        }

        inner.order.push_back(key.clone());
        inner.entries.insert(
            key,
            Entry {
                value,
                inserted_at: now,
                ttl,
            },
        );
    }

    /// Removes `key`. Returns whether it was present.
    pub fn delete(&self, key: &str) -> bool {
        self.lock().remove(key)
    }

    /// Removes every entry.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    /// Removes every entry expired at `now`. Returns how many were removed.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let mut inner = self.lock();
        let before = inner.entries.len();

        inner.entries.retain(|_, entry| entry.is_fresh(now));
        let Inner { entries, order } = &mut *inner;
        order.retain(|key| entries.contains_key(key));

        before - inner.entries.len()
    }

    /// Number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone> Default for ReportCache<V> {
    fn default() -> Self {
        Self::new(
            DEFAULT_CACHE_CAPACITY,
            Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        )
    }
}

/// Builds a deterministic cache key from a report kind and the query shape.
///
/// ## Example
/// ```rust
/// use kasir_core::cache::cache_key;
///
/// let key = cache_key("transactions", &["2026-10-01..2026-10-16", "p1", "l10"]);
/// assert_eq!(key, "transactions:2026-10-01..2026-10-16:p1:l10");
/// ```
pub fn cache_key(kind: &str, parts: &[&str]) -> String {
    let mut key = String::from(kind);
    for part in parts {
        key.push(':');
        key.push_str(part);
    }
    key
}

// =============================================================================
// Unit Tests
// =============================================================================
