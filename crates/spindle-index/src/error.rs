//! Error types for edge index operations.

use spindle_core::DocumentKey;
use spindle_storage::StorageError;
use thiserror::Error;

/// Errors that can occur in edge index operations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// A stored entry could not be decoded.
    #[error("edge index corruption: {0}")]
    Corruption(String),

    /// The document has no usable value in the direction attribute.
    #[error("document {key} is not indexable: {reason}")]
    NotIndexable {
        /// Key of the offending document.
        key: DocumentKey,
        /// What is wrong with the direction attribute.
        reason: String,
    },

    /// An iterator could not be built from a buffer or condition.
    #[error("cannot construct index iterator: {0}")]
    IteratorConstruction(String),

    /// Index metadata could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A storage backend error occurred.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl IndexError {
    /// Returns `true` for errors that concern a single document rather than
    /// the index or the store.
    pub const fn is_per_document(&self) -> bool {
        matches!(self, Self::NotIndexable { .. })
    }
}

/// Result type for edge index operations.
pub type IndexResult<T> = Result<T, IndexError>;
