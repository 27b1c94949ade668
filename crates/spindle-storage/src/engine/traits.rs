//! Core storage engine traits.
//!
//! - [`StorageEngine`] - The entry point that hands out transactions
//! - [`Transaction`] - Point reads and writes plus ordered range cursors
//! - [`Cursor`] - Forward iteration over key-value pairs in key order
//!
//! Keys are compared byte-wise. Every operation names a logical table so
//! several key spaces can share one engine.

use std::ops::Bound;
use std::sync::Arc;

use super::StorageError;

/// A key-value pair returned by cursor operations.
pub type KeyValue = (Vec<u8>, Vec<u8>);

/// Result type for cursor operations that return a key-value pair.
pub type CursorResult = Result<Option<KeyValue>, StorageError>;

/// A storage engine that provides transactional key-value operations.
///
/// # Example
///
/// ```
/// use spindle_storage::backends::RedbEngine;
/// use spindle_storage::{StorageEngine, StorageError, Transaction};
///
/// fn example<E: StorageEngine>(engine: &E) -> Result<(), StorageError> {
///     let mut tx = engine.begin_write()?;
///     tx.put("my_table", b"key", b"value")?;
///     tx.commit()?;
///
///     let tx = engine.begin_read()?;
///     assert_eq!(tx.get("my_table", b"key")?, Some(b"value".to_vec()));
///     Ok(())
/// }
///
/// example(&RedbEngine::in_memory()?)?;
/// # Ok::<(), StorageError>(())
/// ```
pub trait StorageEngine: Send + Sync {
    /// The transaction type for this engine.
    type Transaction<'a>: Transaction
    where
        Self: 'a;

    /// Begin a read-only transaction over a consistent snapshot.
    fn begin_read(&self) -> Result<Self::Transaction<'_>, StorageError>;

    /// Begin a read-write transaction.
    ///
    /// Depending on the backend, write transactions may be serialized.
    fn begin_write(&self) -> Result<Self::Transaction<'_>, StorageError>;

    /// Flush any buffered data to durable storage.
    ///
    /// The default implementation does nothing, as most backends make data
    /// durable on commit.
    fn flush(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// A transaction that provides ACID key-value operations.
///
/// Write transactions must be explicitly committed; dropping one without
/// committing rolls its changes back.
pub trait Transaction {
    /// The cursor type for iteration.
    type Cursor<'a>: Cursor
    where
        Self: 'a;

    /// Get a value by key from a table.
    ///
    /// Returns `Ok(None)` if the key (or the table) does not exist.
    fn get(&self, table: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError>;

    /// Put a key-value pair into a table, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReadOnly`] on a read-only transaction.
    fn put(&mut self, table: &str, key: &[u8], value: &[u8]) -> Result<(), StorageError>;

    /// Delete a key from a table.
    ///
    /// Returns `Ok(true)` if the key was deleted, `Ok(false)` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReadOnly`] on a read-only transaction.
    fn delete(&mut self, table: &str, key: &[u8]) -> Result<bool, StorageError>;

    /// Create a cursor over every key-value pair in a table.
    ///
    /// The cursor starts unpositioned; the first [`Cursor::next`] yields the
    /// smallest key.
    fn cursor(&self, table: &str) -> Result<Self::Cursor<'_>, StorageError>;

    /// Create a cursor restricted to a range of keys.
    ///
    /// ```
    /// use std::ops::Bound;
    ///
    /// use spindle_storage::backends::RedbEngine;
    /// use spindle_storage::{Cursor, StorageEngine, Transaction};
    ///
    /// let engine = RedbEngine::in_memory()?;
    /// let mut tx = engine.begin_write()?;
    /// for key in [b"a", b"m", b"z"] {
    ///     tx.put("t", key, b"")?;
    /// }
    ///
    /// // Scan keys from "a" (inclusive) to "z" (exclusive)
    /// let mut cursor = tx.range("t", Bound::Included(b"a".as_slice()), Bound::Excluded(b"z".as_slice()))?;
    /// assert_eq!(cursor.next()?.map(|(k, _)| k), Some(b"a".to_vec()));
    /// assert_eq!(cursor.next()?.map(|(k, _)| k), Some(b"m".to_vec()));
    /// assert_eq!(cursor.next()?, None);
    /// # Ok::<(), spindle_storage::StorageError>(())
    /// ```
    fn range(
        &self,
        table: &str,
        start: Bound<&[u8]>,
        end: Bound<&[u8]>,
    ) -> Result<Self::Cursor<'_>, StorageError>;

    /// Tell the transaction that about `additional` more writes will follow.
    ///
    /// Backends may use this to pre-size write buffers. The default does nothing.
    fn reserve(&mut self, _additional: usize) -> Result<(), StorageError> {
        Ok(())
    }

    /// Commit the transaction, making all changes durable.
    fn commit(self) -> Result<(), StorageError>;

    /// Roll the transaction back, discarding all changes.
    fn rollback(self) -> Result<(), StorageError>;

    /// Check if this is a read-only transaction.
    fn is_read_only(&self) -> bool;
}

/// A forward cursor over key-value pairs in key order.
///
/// ```ignore
/// let mut cursor = tx.cursor("my_table")?;
///
/// // Position at first key >= "prefix"
/// let mut entry = cursor.seek(b"prefix")?;
/// while let Some((key, value)) = entry {
///     // process
///     entry = cursor.next()?;
/// }
/// ```
pub trait Cursor {
    /// Position at the first key greater than or equal to `key` and return it.
    ///
    /// The cursor's own range bounds still apply.
    fn seek(&mut self, key: &[u8]) -> CursorResult;

    /// Position at the first key in range and return it.
    fn seek_first(&mut self) -> CursorResult;

    /// Advance and return the next key-value pair.
    ///
    /// On an unpositioned cursor this behaves like [`Cursor::seek_first`].
    /// Once the end is reached every further call returns `None`.
    fn next(&mut self) -> CursorResult;

    /// Get the current key-value pair without advancing.
    fn current(&self) -> Option<(&[u8], &[u8])>;
}

impl<E: StorageEngine> StorageEngine for Arc<E> {
    type Transaction<'a>
        = E::Transaction<'a>
    where
        Self: 'a;

    fn begin_read(&self) -> Result<Self::Transaction<'_>, StorageError> {
        (**self).begin_read()
    }

    fn begin_write(&self) -> Result<Self::Transaction<'_>, StorageError> {
        (**self).begin_write()
    }

    fn flush(&self) -> Result<(), StorageError> {
        (**self).flush()
    }
}
