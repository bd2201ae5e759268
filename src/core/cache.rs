//! Cache storage abstractions.
//!
//! Collections store raw bytes; [`CacheStore`] layers a typed, timestamped
//! entry on top of a collection.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// A named key-value space.
#[async_trait]
pub trait KeyValueCollection: Send + Sync {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;
    async fn put(&self, key: &[u8], value: Vec<u8>) -> Result<()>;
    async fn remove(&self, key: &[u8]) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}

/// Hands out collections by name.
pub trait Store: Send + Sync {
    fn get_collection(&self, name: &str) -> Result<Arc<dyn KeyValueCollection>>;
}

/// A cached payload and the time it was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub payload: T,
    pub stored_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn new(payload: T) -> Self {
        Self {
            payload,
            stored_at: Utc::now(),
        }
    }

    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.stored_at) > ttl
    }
}

/// Typed view over a collection, one JSON encoded [`CacheEntry`] per key.
pub struct CacheStore<T> {
    collection: Arc<dyn KeyValueCollection>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for CacheStore<T> {
    fn clone(&self) -> Self {
        Self {
            collection: Arc::clone(&self.collection),
            _marker: PhantomData,
        }
    }
}

impl<T> CacheStore<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    pub fn new(collection: Arc<dyn KeyValueCollection>) -> Self {
        Self {
            collection,
            _marker: PhantomData,
        }
    }

    pub async fn get(&self, key: &str) -> Result<Option<CacheEntry<T>>> {
        let Some(bytes) = self.collection.get(key.as_bytes()).await? else {
            return Ok(None);
        };
        let entry = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to decode cache entry for key: {key}"))?;
        Ok(Some(entry))
    }

    /// Overwrites `key` with `payload` stamped with the current time.
    pub async fn put(&self, key: &str, payload: &T) -> Result<()> {
        let entry = CacheEntry {
            payload,
            stored_at: Utc::now(),
        };
        let bytes = serde_json::to_vec(&entry)
            .with_context(|| format!("Failed to encode cache entry for key: {key}"))?;
        self.collection.put(key.as_bytes(), bytes).await?;
        debug!("Stored cache entry for key: {}", key);
        Ok(())
    }

    pub async fn clear(&self, key: &str) -> Result<()> {
        self.collection.remove(key.as_bytes()).await
    }

    pub async fn clear_all(&self) -> Result<()> {
        self.collection.clear().await
    }
}
