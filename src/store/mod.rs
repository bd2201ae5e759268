pub mod disk;
pub mod memory;

use crate::core::cache::{KeyValueCollection, Store};
use anyhow::{Result, anyhow};
use disk::DiskCollection;
use fjall::{Keyspace, PartitionCreateOptions};
use memory::MemoryCollection;
use std::path::Path;
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};
use tracing::{debug, warn};

/// A thread-safe key-value store that can hold multiple collections.
///
/// Collections are persisted in a fjall keyspace when one could be opened,
/// and kept in memory otherwise.
pub struct KeyValueStore {
    collections: RwLock<HashMap<String, Arc<dyn KeyValueCollection>>>,
    keyspace: Option<Keyspace>,
}

impl KeyValueStore {
    /// Opens the on-disk keyspace under `path`, falling back to memory when
    /// it cannot be opened. The cache is never a reason to fail startup.
    pub fn open(path: &Path) -> Self {
        let keyspace = match fjall::Config::new(path.join("cache")).open() {
            Ok(keyspace) => Some(keyspace),
            Err(e) => {
                warn!(
                    "Could not open cache at {}: {}. Using memory cache.",
                    path.display(),
                    e
                );
                None
            }
        };
        Self {
            collections: RwLock::new(HashMap::new()),
            keyspace,
        }
    }

    pub fn in_memory() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            keyspace: None,
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.keyspace.is_some()
    }
}

impl Store for KeyValueStore {
    fn get_collection(&self, name: &str) -> Result<Arc<dyn KeyValueCollection>> {
        {
            let collections = self
                .collections
                .read()
                .map_err(|_| anyhow!("Collection registry poisoned"))?;
            if let Some(collection) = collections.get(name) {
                return Ok(Arc::clone(collection));
            }
        }

        let mut collections = self
            .collections
            .write()
            .map_err(|_| anyhow!("Collection registry poisoned"))?;
        if let Some(collection) = collections.get(name) {
            return Ok(Arc::clone(collection));
        }

        let collection: Arc<dyn KeyValueCollection> = match &self.keyspace {
            Some(keyspace) => {
                let partition =
                    keyspace.open_partition(name, PartitionCreateOptions::default())?;
                debug!("Opened persistent collection: {}", name);
                Arc::new(DiskCollection::new(keyspace.clone(), partition))
            }
            None => {
                debug!("Created memory collection: {}", name);
                Arc::new(MemoryCollection::new())
            }
        };
        collections.insert(name.to_string(), Arc::clone(&collection));
        Ok(collection)
    }
}
