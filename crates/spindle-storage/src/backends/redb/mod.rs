//! Redb storage backend.
//!
//! Redb is a pure-Rust embedded database with ACID transactions. Logical
//! tables are multiplexed over one physical Redb table, see [`tables`].
//!
//! # Example
//!
//! ```
//! use spindle_storage::backends::RedbEngine;
//! use spindle_storage::{StorageEngine, Transaction};
//!
//! let engine = RedbEngine::in_memory()?;
//!
//! let mut tx = engine.begin_write()?;
//! tx.put("edges", b"k1", b"v1")?;
//! tx.commit()?;
//!
//! let tx = engine.begin_read()?;
//! assert_eq!(tx.get("edges", b"k1")?, Some(b"v1".to_vec()));
//! # Ok::<(), spindle_storage::StorageError>(())
//! ```
//!
//! # Configuration
//!
//! ```no_run
//! use spindle_storage::backends::redb::{RedbConfig, RedbEngine};
//!
//! let config = RedbConfig::new().cache_size(64 * 1024 * 1024);
//! let engine = RedbEngine::open_with_config("edges.redb", config)?;
//! # Ok::<(), spindle_storage::StorageError>(())
//! ```

mod engine;
pub mod tables;
mod transaction;

pub use engine::{RedbConfig, RedbEngine};
pub use transaction::{RedbCursor, RedbTransaction};
