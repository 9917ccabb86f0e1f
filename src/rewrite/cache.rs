//! In-memory cache for rewrite results.
//!
//! Entries are keyed by the SHA-256 of the sanitized prompt, expire after a
//! fixed TTL, and the least recently used entry is evicted once the cache is
//! at capacity. Expired entries are purged before any eviction.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The stored result of a successful rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedRewrite {
    pub rewritten: String,
    pub suggestions: Vec<String>,
    pub explanation: String,
}

/// Cache key for a sanitized prompt: lowercase hex SHA-256.
pub fn cache_key(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

#[derive(Debug)]
struct CacheEntry {
    value: CachedRewrite,
    inserted: Instant,
    last_used: u64,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, CacheEntry>,
    tick: u64,
}

impl Inner {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }
}

/// TTL + LRU cache shared across concurrent callers.
#[derive(Debug)]
pub struct RewriteCache {
    inner: Mutex<Inner>,
    capacity: usize,
    ttl: Duration,
}

impl RewriteCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            capacity,
            ttl,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of entries currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.inner.lock().map(|i| i.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner
            .lock()
            .map(|i| i.entries.contains_key(key))
            .unwrap_or(false)
    }

    /// Get a live entry and mark it as recently used.
    pub fn get(&self, key: &str) -> Option<CachedRewrite> {
        self.get_at(key, Instant::now())
    }

    pub fn get_at(&self, key: &str, now: Instant) -> Option<CachedRewrite> {
        let mut inner = self.inner.lock().ok()?;

        let expired = match inner.entries.get(key) {
            Some(entry) => now.saturating_duration_since(entry.inserted) >= self.ttl,
            None => return None,
        };
        if expired {
            inner.entries.remove(key);
            return None;
        }

        let tick = inner.next_tick();
        let entry = inner.entries.get_mut(key)?;
        entry.last_used = tick;
        Some(entry.value.clone())
    }

    /// Store an entry, evicting as needed.
    pub fn insert(&self, key: String, value: CachedRewrite) {
        self.insert_at(key, value, Instant::now());
    }

    pub fn insert_at(&self, key: String, value: CachedRewrite, now: Instant) {
        if self.capacity == 0 {
            return;
        }
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };

        let ttl = self.ttl;
        inner
            .entries
            .retain(|_, e| now.saturating_duration_since(e.inserted) < ttl);

        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.capacity {
            let oldest = inner
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                inner.entries.remove(&oldest);
            }
        }

        let tick = inner.next_tick();
        inner.entries.insert(
            key,
            CacheEntry {
                value,
                inserted: now,
                last_used: tick,
            },
        );
    }

    pub fn clear(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.entries.clear();
        }
    }
}
