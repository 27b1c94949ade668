//! Storage engine traits and abstractions.
//!
//! This module defines the core traits that storage backends must implement.

mod error;
mod traits;

pub use error::{StorageError, StorageResult};
pub use traits::{Cursor, CursorResult, KeyValue, StorageEngine, Transaction};
