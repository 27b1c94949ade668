//! Redb storage engine.

use std::path::Path;

use redb::Database;
use tracing::debug;

use crate::engine::{StorageEngine, StorageError};

use super::transaction::RedbTransaction;

/// Configuration options for the Redb storage engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedbConfig {
    /// Cache size in bytes. Uses Redb's default when unset.
    pub cache_size: Option<usize>,

    /// Rows fetched per cursor refill.
    pub cursor_batch_size: Option<usize>,
}

impl RedbConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cache size.
    #[must_use]
    pub const fn cache_size(mut self, size: usize) -> Self {
        self.cache_size = Some(size);
        self
    }

    /// Set the number of rows a cursor loads at a time.
    #[must_use]
    pub const fn cursor_batch_size(mut self, rows: usize) -> Self {
        self.cursor_batch_size = Some(rows);
        self
    }
}

/// A storage engine backed by Redb.
pub struct RedbEngine {
    db: Database,
    batch_size: usize,
}

impl RedbEngine {
    /// Open or create a database file with default configuration.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        Self::open_with_config(path, RedbConfig::default())
    }

    /// Open or create a database file with custom configuration.
    pub fn open_with_config(
        path: impl AsRef<Path>,
        config: RedbConfig,
    ) -> Result<Self, StorageError> {
        let mut builder = Database::builder();
        if let Some(cache_size) = config.cache_size {
            builder.set_cache_size(cache_size);
        }

        let path = path.as_ref();
        let db = builder.create(path).map_err(|e| StorageError::Open(e.to_string()))?;
        debug!(path = %path.display(), "opened redb database");

        Ok(Self::with_database(db, config))
    }

    /// Create an in-memory database, lost when the engine is dropped.
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::in_memory_with_config(RedbConfig::default())
    }

    /// Create an in-memory database with custom configuration.
    pub fn in_memory_with_config(config: RedbConfig) -> Result<Self, StorageError> {
        let db = Database::builder()
            .create_with_backend(redb::backends::InMemoryBackend::new())
            .map_err(|e| StorageError::Open(e.to_string()))?;
        Ok(Self::with_database(db, config))
    }

    fn with_database(db: Database, config: RedbConfig) -> Self {
        let batch_size =
            config.cursor_batch_size.unwrap_or(RedbTransaction::DEFAULT_BATCH_SIZE).max(1);
        Self { db, batch_size }
    }

    /// Get the underlying Redb database.
    pub const fn inner(&self) -> &Database {
        &self.db
    }
}

impl StorageEngine for RedbEngine {
    type Transaction<'a> = RedbTransaction;

    fn begin_read(&self) -> Result<Self::Transaction<'_>, StorageError> {
        let tx = self.db.begin_read().map_err(|e| StorageError::Transaction(e.to_string()))?;
        Ok(RedbTransaction::new_read(tx, self.batch_size))
    }

    fn begin_write(&self) -> Result<Self::Transaction<'_>, StorageError> {
        let tx = self.db.begin_write().map_err(|e| StorageError::Transaction(e.to_string()))?;
        Ok(RedbTransaction::new_write(tx, self.batch_size))
    }
}
