//! Response caching for the explorer client.
//!
//! The cache is injected into the client rather than held as global state,
//! so callers choose whether and how long responses are reused.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Key → JSON value store with per-entry time-to-live.
pub trait ResponseCache: Send + Sync {
    /// Fetch a value that has not yet expired.
    fn get(&self, key: &str) -> Option<Value>;

    /// Store a value for `ttl`.
    fn put(&self, key: &str, value: Value, ttl: Duration);
}

/// Cache that stores nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl ResponseCache for NoCache {
    fn get(&self, _key: &str) -> Option<Value> {
        None
    }

    fn put(&self, _key: &str, _value: Value, _ttl: Duration) {}
}

struct Entry {
    value: Value,
    expires_at: Instant,
}

/// Process-local cache guarded by a mutex.
#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired entry.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.lock().retain(|_, entry| entry.expires_at > now);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        // a panic while holding the lock cannot leave an entry half-written
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ResponseCache for InMemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        let mut entries = self.lock();
        let expired = match entries.get(key) {
            Some(entry) if entry.expires_at > now => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(key);
        }
        None
    }

    fn put(&self, key: &str, value: Value, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        self.lock().insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }
}
