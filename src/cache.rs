use anyhow::{Result, anyhow};
use rand::Rng;
use serde::{Serialize, de::DeserializeOwned};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::LazyLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;

static GLOBAL_CACHE: LazyLock<MemoryCache> = LazyLock::new(MemoryCache::new);

/// Stored value plus its expiry, encoded so heterogeneous types share one map.
struct StoredEntry {
    value: Vec<u8>,
    expires_at: u64, // Unix timestamp (seconds)
}

/// Process-local TTL cache. Entries live in memory only and are gone with
/// process exit; expired entries are dropped on read.
pub struct MemoryCache {
    store: RwLock<HashMap<String, StoredEntry>>,
}

impl MemoryCache {
    fn new() -> Self {
        MemoryCache {
            store: RwLock::new(HashMap::new()),
        }
    }

    /// Stores a serializable value with a time-to-live (TTL).
    #[tracing::instrument(name = "put_cache", level = "debug", skip(self, value))]
    pub async fn put<T: Serialize + Debug>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let expires_at = SystemTime::now()
            .checked_add(ttl)
            .ok_or(anyhow!("TTL overflow"))?
            .duration_since(UNIX_EPOCH)?
            .as_secs();
        let bytes = serde_json::to_vec(value)?;

        let mut store = self.store.write().await;
        store.insert(key.to_string(), StoredEntry { value: bytes, expires_at });
        Ok(())
    }

    /// Retrieves a value if it exists and has not expired.
    /// Returns `None` for cache misses or expired entries.
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self))]
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

        {
            let store = self.store.read().await;
            match store.get(key) {
                Some(entry) if now < entry.expires_at => {
                    tracing::debug!("Key found and still fresh");
                    return Ok(Some(serde_json::from_slice(&entry.value)?));
                }
                Some(_) => tracing::debug!("Key found but expired"),
                None => {
                    tracing::debug!("Key not found");
                    return Ok(None);
                }
            }
        }

        self.remove(key).await?;
        Ok(None)
    }

    /// Manually removes a key from the cache.
    pub async fn remove(&self, key: &str) -> Result<()> {
        let mut store = self.store.write().await;
        store.remove(key);
        Ok(())
    }
}

// Public, ergonomic API endpoints that use the global cache.
pub async fn put<T: Serialize + Debug>(key: &str, value: &T, ttl: Duration) -> Result<()> {
    GLOBAL_CACHE.put(key, value, ttl).await
}

pub async fn get<T: DeserializeOwned>(key: &str) -> Result<Option<T>> {
    GLOBAL_CACHE.get(key).await
}

pub async fn remove(key: &str) -> Result<()> {
    GLOBAL_CACHE.remove(key).await
}

/// Spread a TTL by ±10% so entries populated in one burst don't all expire
/// in the same instant.
pub fn jittered(ttl: Duration) -> Duration {
    let factor: f64 = rand::rng().random_range(0.9..1.1);
    Duration::from_secs((ttl.as_secs_f64() * factor) as u64)
}
