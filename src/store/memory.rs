use crate::core::cache::KeyValueCollection;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory collection, lost on restart.
#[derive(Clone, Default)]
pub struct MemoryCollection {
    inner: Arc<Mutex<HashMap<Vec<u8>, Vec<u8>>>>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueCollection for MemoryCollection {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let cache = self.inner.lock().await;
        let value = cache.get(key).cloned();
        if value.is_some() {
            debug!("Cache HIT for key: {}", String::from_utf8_lossy(key));
        } else {
            debug!("Cache MISS for key: {}", String::from_utf8_lossy(key));
        }
        Ok(value)
    }

    async fn put(&self, key: &[u8], value: Vec<u8>) -> Result<()> {
        let mut cache = self.inner.lock().await;
        debug!("Cache PUT for key: {}", String::from_utf8_lossy(key));
        cache.insert(key.to_vec(), value);
        Ok(())
    }

    async fn remove(&self, key: &[u8]) -> Result<()> {
        let mut cache = self.inner.lock().await;
        cache.remove(key);
        debug!("Cache REMOVE for key: {}", String::from_utf8_lossy(key));
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut cache = self.inner.lock().await;
        cache.clear();
        debug!("Cache CLEAR");
        Ok(())
    }
}
