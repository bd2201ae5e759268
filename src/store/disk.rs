use crate::core::cache::KeyValueCollection;
use anyhow::{Context, Result};
use async_trait::async_trait;
use fjall::{Keyspace, PartitionHandle, PersistMode};
use tracing::debug;

/// Collection backed by a fjall partition. Every write is persisted before
/// returning so entries survive a restart.
#[derive(Clone)]
pub struct DiskCollection {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskCollection {
    pub fn new(keyspace: Keyspace, partition: PartitionHandle) -> Self {
        Self {
            keyspace,
            partition,
        }
    }
}

#[async_trait]
impl KeyValueCollection for DiskCollection {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let partition = self.partition.clone();
        let owned_key = key.to_vec();
        let value = tokio::task::spawn_blocking(move || partition.get(owned_key))
            .await
            .context("Cache read task failed")??;
        match &value {
            Some(_) => debug!("Cache HIT for key: {}", String::from_utf8_lossy(key)),
            None => debug!("Cache MISS for key: {}", String::from_utf8_lossy(key)),
        }
        Ok(value.map(|slice| slice.to_vec()))
    }

    async fn put(&self, key: &[u8], value: Vec<u8>) -> Result<()> {
        let keyspace = self.keyspace.clone();
        let partition = self.partition.clone();
        let owned_key = key.to_vec();
        tokio::task::spawn_blocking(move || -> Result<()> {
            partition.insert(owned_key, value)?;
            keyspace.persist(PersistMode::SyncAll)?;
            Ok(())
        })
        .await
        .context("Cache write task failed")??;
        debug!("Cache PUT for key: {}", String::from_utf8_lossy(key));
        Ok(())
    }

    async fn remove(&self, key: &[u8]) -> Result<()> {
        let keyspace = self.keyspace.clone();
        let partition = self.partition.clone();
        let owned_key = key.to_vec();
        tokio::task::spawn_blocking(move || -> Result<()> {
            partition.remove(owned_key)?;
            keyspace.persist(PersistMode::SyncAll)?;
            Ok(())
        })
        .await
        .context("Cache remove task failed")??;
        debug!("Cache REMOVE for key: {}", String::from_utf8_lossy(key));
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let keyspace = self.keyspace.clone();
        let partition = self.partition.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let keys = partition.keys().collect::<std::result::Result<Vec<_>, _>>()?;
            for key in keys {
                partition.remove(key)?;
            }
            keyspace.persist(PersistMode::SyncAll)?;
            Ok(())
        })
        .await
        .context("Cache clear task failed")??;
        debug!("Cache CLEAR");
        Ok(())
    }
}
