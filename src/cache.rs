//! Shared key-value cache with TTL.
//!
//! A single abstract store; hashing call parameters into a stable key is
//! the caller's (adapter's) responsibility, not the store's. Callers
//! namespace keys by adapter/purpose (e.g. `"route:<hash>"`,
//! `"nominatim:search:<hash>"`) so one store backs all of routing and
//! provider caching.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

/// A cached value with its expiry, in Unix seconds.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: String,
    pub created_at: i64,
    pub expires_at: i64,
}

/// Opaque string keys and values, TTL-bounded. Implementations must be
/// safe to share across threads: reads are lock-free-consistent, writes
/// are last-write-wins per key.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn put(&self, key: &str, value: String, ttl_days: u32);
    fn delete(&self, key: &str);
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// In-memory `CacheStore`. A real deployment backs this with the
/// persistence layer's durable storage; this is the crate's own reference
/// adapter so routing/provider code is testable without one.
#[derive(Debug, Default)]
pub struct InMemoryCacheStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for InMemoryCacheStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().ok()?;
        let entry = entries.get(key)?;
        if entry.expires_at <= now_unix() {
            return None;
        }
        Some(entry.value.clone())
    }

    fn put(&self, key: &str, value: String, ttl_days: u32) {
        let created_at = now_unix();
        let expires_at = created_at + i64::from(ttl_days) * 86_400;
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(
                key.to_string(),
                CacheEntry {
                    value,
                    created_at,
                    expires_at,
                },
            );
        }
    }

    fn delete(&self, key: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(key);
        }
    }
}

/// Stable hash of arbitrary `Display`-able parts into a cache key, scoped
/// under `namespace`. Mirrors the convention of hashing sorted-JSON
/// parameters used by the HTTP-backed adapters this crate stands in for.
pub fn stable_key(namespace: &str, parts: &[String]) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    for part in parts {
        part.hash(&mut hasher);
    }
    format!("{namespace}:{:016x}", hasher.finish())
}
