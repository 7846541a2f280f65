//! Redb-backed durable configuration store.
//!
//! Uses Redb's ACID transactions with Copy-on-Write for crash safety. The
//! rotation configuration survives process restarts; a crash mid-rotation
//! leaves either the old or the new record, never a mix.

use std::{path::Path, sync::Arc};

use redb::{Database, TableDefinition};
use zeroize::Zeroize;

use super::{CONFIG_STORAGE_KEY, ConfigStore, StorageError};
use crate::StoredSeedConfig;

/// Table: config
/// Key: storage key (always [`CONFIG_STORAGE_KEY`])
/// Value: CBOR-encoded StoredSeedConfig
const CONFIG: TableDefinition<&str, &[u8]> = TableDefinition::new("config");

/// Durable configuration store backed by Redb.
///
/// Thread-safe through Redb's internal locking. Clone is cheap (Arc).
#[derive(Clone)]
pub struct RedbConfigStore {
    db: Arc<Database>,
}

impl RedbConfigStore {
    /// Open or create a Redb database at the given path.
    ///
    /// Creates the CONFIG table if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the database cannot be opened or created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = Database::create(path.as_ref()).map_err(|e| StorageError::Io(e.to_string()))?;

        let txn = db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;
        {
            let _ = txn.open_table(CONFIG).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| StorageError::Io(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl ConfigStore for RedbConfigStore {
    fn load_config(&self) -> Result<Option<StoredSeedConfig>, StorageError> {
        let txn = self.db.begin_read().map_err(|e| StorageError::Io(e.to_string()))?;
        let table = txn.open_table(CONFIG).map_err(|e| StorageError::Io(e.to_string()))?;

        match table.get(CONFIG_STORAGE_KEY).map_err(|e| StorageError::Io(e.to_string()))? {
            Some(value) => {
                let config: StoredSeedConfig = ciborium::from_reader(value.value())
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;
                Ok(Some(config))
            },
            None => Ok(None),
        }
    }

    fn store_config(&self, config: &StoredSeedConfig) -> Result<(), StorageError> {
        let mut bytes = Vec::new();
        ciborium::into_writer(config, &mut bytes)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let result = self.write_encoded(&bytes);
        bytes.zeroize();
        result
    }
}

impl RedbConfigStore {
    fn write_encoded(&self, bytes: &[u8]) -> Result<(), StorageError> {
        let txn = self.db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;
        {
            let mut table = txn.open_table(CONFIG).map_err(|e| StorageError::Io(e.to_string()))?;
            table
                .insert(CONFIG_STORAGE_KEY, bytes)
                .map_err(|e| StorageError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| StorageError::Io(e.to_string()))?;

        Ok(())
    }
}
