//! Redb transactions and cursors.
//!
//! Cursors stream their range in batches instead of materializing it: each
//! refill opens the data table, reads up to `batch_size` rows past the last
//! key returned, and closes it again.

use std::collections::VecDeque;
use std::ops::Bound;

use redb::{ReadTransaction, ReadableTable, TableError, WriteTransaction};

use crate::engine::{Cursor, CursorResult, KeyValue, StorageError, Transaction};

use super::tables::{decode_key, encode_key, table_end_key, table_start_key, DATA_TABLE};

fn internal(e: impl std::fmt::Display) -> StorageError {
    StorageError::Internal(e.to_string())
}

fn borrowed(bound: &Bound<Vec<u8>>) -> Bound<&[u8]> {
    match bound {
        Bound::Included(k) => Bound::Included(k.as_slice()),
        Bound::Excluded(k) => Bound::Excluded(k.as_slice()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

fn owned(bound: Bound<&[u8]>) -> Bound<Vec<u8>> {
    match bound {
        Bound::Included(k) => Bound::Included(k.to_vec()),
        Bound::Excluded(k) => Bound::Excluded(k.to_vec()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

fn is_empty_range(start: &Bound<Vec<u8>>, end: &Bound<Vec<u8>>) -> bool {
    match (start, end) {
        (Bound::Included(s), Bound::Included(e)) => s > e,
        (Bound::Included(s) | Bound::Excluded(s), Bound::Excluded(e))
        | (Bound::Excluded(s), Bound::Included(e)) => s >= e,
        _ => false,
    }
}

fn lookup<T>(table: &T, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    Ok(table.get(key).map_err(internal)?.map(|v| v.value().to_vec()))
}

fn scan<T>(
    table: &T,
    start: &Bound<Vec<u8>>,
    end: &Bound<Vec<u8>>,
    limit: usize,
) -> Result<Vec<KeyValue>, StorageError>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    let mut rows = Vec::with_capacity(limit.min(1024));
    if is_empty_range(start, end) {
        return Ok(rows);
    }
    for entry in table.range::<&[u8]>((borrowed(start), borrowed(end))).map_err(internal)? {
        let (k, v) = entry.map_err(internal)?;
        if let Some((_, key)) = decode_key(k.value()) {
            rows.push((key.to_vec(), v.value().to_vec()));
        }
        if rows.len() >= limit {
            break;
        }
    }
    Ok(rows)
}

#[allow(clippy::large_enum_variant)]
enum Inner {
    Read(ReadTransaction),
    Write(WriteTransaction),
}

/// A read-only or read-write Redb transaction.
pub struct RedbTransaction {
    inner: Inner,
    batch_size: usize,
}

impl RedbTransaction {
    /// Rows loaded per cursor refill unless configured otherwise.
    pub const DEFAULT_BATCH_SIZE: usize = 1000;

    /// Wrap a read-only transaction.
    pub const fn new_read(tx: ReadTransaction, batch_size: usize) -> Self {
        Self { inner: Inner::Read(tx), batch_size }
    }

    /// Wrap a read-write transaction.
    pub const fn new_write(tx: WriteTransaction, batch_size: usize) -> Self {
        Self { inner: Inner::Write(tx), batch_size }
    }

    /// Fetch up to `limit` rows of `table` within the given logical bounds.
    fn fetch_batch(
        &self,
        table: &str,
        start: Bound<&[u8]>,
        end: Bound<&[u8]>,
        limit: usize,
    ) -> Result<Vec<KeyValue>, StorageError> {
        let physical_start = match start {
            Bound::Included(k) => Bound::Included(encode_key(table, k)),
            Bound::Excluded(k) => Bound::Excluded(encode_key(table, k)),
            Bound::Unbounded => Bound::Included(table_start_key(table)),
        };
        let physical_end = match end {
            Bound::Included(k) => Bound::Included(encode_key(table, k)),
            Bound::Excluded(k) => Bound::Excluded(encode_key(table, k)),
            Bound::Unbounded => Bound::Excluded(table_end_key(table)),
        };

        match &self.inner {
            Inner::Read(tx) => match tx.open_table(DATA_TABLE) {
                Ok(t) => scan(&t, &physical_start, &physical_end, limit),
                Err(TableError::TableDoesNotExist(_)) => Ok(Vec::new()),
                Err(e) => Err(internal(e)),
            },
            Inner::Write(tx) => match tx.open_table(DATA_TABLE) {
                Ok(t) => scan(&t, &physical_start, &physical_end, limit),
                Err(TableError::TableDoesNotExist(_)) => Ok(Vec::new()),
                Err(e) => Err(internal(e)),
            },
        }
    }
}

impl Transaction for RedbTransaction {
    type Cursor<'a>
        = RedbCursor<'a>
    where
        Self: 'a;

    fn get(&self, table: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let key = encode_key(table, key);
        match &self.inner {
            Inner::Read(tx) => match tx.open_table(DATA_TABLE) {
                Ok(t) => lookup(&t, &key),
                Err(TableError::TableDoesNotExist(_)) => Ok(None),
                Err(e) => Err(internal(e)),
            },
            Inner::Write(tx) => match tx.open_table(DATA_TABLE) {
                Ok(t) => lookup(&t, &key),
                Err(TableError::TableDoesNotExist(_)) => Ok(None),
                Err(e) => Err(internal(e)),
            },
        }
    }

    fn put(&mut self, table: &str, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        let Inner::Write(tx) = &self.inner else {
            return Err(StorageError::ReadOnly);
        };
        let key = encode_key(table, key);
        let mut t = tx.open_table(DATA_TABLE).map_err(internal)?;
        t.insert(key.as_slice(), value).map_err(internal)?;
        Ok(())
    }

    fn delete(&mut self, table: &str, key: &[u8]) -> Result<bool, StorageError> {
        let Inner::Write(tx) = &self.inner else {
            return Err(StorageError::ReadOnly);
        };
        let key = encode_key(table, key);
        match tx.open_table(DATA_TABLE) {
            Ok(mut t) => Ok(t.remove(key.as_slice()).map_err(internal)?.is_some()),
            Err(TableError::TableDoesNotExist(_)) => Ok(false),
            Err(e) => Err(internal(e)),
        }
    }

    fn cursor(&self, table: &str) -> Result<Self::Cursor<'_>, StorageError> {
        Ok(RedbCursor::new(self, table, Bound::Unbounded, Bound::Unbounded))
    }

    fn range(
        &self,
        table: &str,
        start: Bound<&[u8]>,
        end: Bound<&[u8]>,
    ) -> Result<Self::Cursor<'_>, StorageError> {
        Ok(RedbCursor::new(self, table, owned(start), owned(end)))
    }

    fn commit(self) -> Result<(), StorageError> {
        match self.inner {
            Inner::Read(_) => Ok(()),
            Inner::Write(tx) => tx.commit().map_err(|e| StorageError::Transaction(e.to_string())),
        }
    }

    fn rollback(self) -> Result<(), StorageError> {
        match self.inner {
            Inner::Read(_) => Ok(()),
            Inner::Write(tx) => tx.abort().map_err(|e| StorageError::Transaction(e.to_string())),
        }
    }

    fn is_read_only(&self) -> bool {
        matches!(self.inner, Inner::Read(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorState {
    Unpositioned,
    /// `more` is set while rows past the loaded batch may exist.
    Active {
        more: bool,
    },
    Exhausted,
}

/// A streaming forward cursor over a key range of one logical table.
///
/// At most one batch of rows plus the current row are held in memory.
pub struct RedbCursor<'a> {
    tx: &'a RedbTransaction,
    table: String,
    start: Bound<Vec<u8>>,
    end: Bound<Vec<u8>>,
    batch: VecDeque<KeyValue>,
    current: Option<KeyValue>,
    state: CursorState,
}

impl<'a> RedbCursor<'a> {
    fn new(
        tx: &'a RedbTransaction,
        table: &str,
        start: Bound<Vec<u8>>,
        end: Bound<Vec<u8>>,
    ) -> Self {
        Self {
            tx,
            table: table.to_owned(),
            start,
            end,
            batch: VecDeque::new(),
            current: None,
            state: CursorState::Unpositioned,
        }
    }

    fn load(&mut self, from: Bound<&[u8]>) -> Result<bool, StorageError> {
        let rows =
            self.tx.fetch_batch(&self.table, from, borrowed(&self.end), self.tx.batch_size)?;
        let more = rows.len() >= self.tx.batch_size;
        self.batch = rows.into();
        Ok(more)
    }

    fn position_at(&mut self, from: Bound<Vec<u8>>) -> CursorResult {
        let more = self.load(borrowed(&from))?;
        self.advance(more)
    }

    fn advance(&mut self, more: bool) -> CursorResult {
        self.current = self.batch.pop_front();
        self.state = if self.current.is_some() {
            CursorState::Active { more }
        } else {
            self.batch.clear();
            CursorState::Exhausted
        };
        Ok(self.current.clone())
    }
}

impl Cursor for RedbCursor<'_> {
    fn seek(&mut self, key: &[u8]) -> CursorResult {
        let from = match &self.start {
            Bound::Included(s) if s.as_slice() >= key => Bound::Included(s.clone()),
            Bound::Excluded(s) if s.as_slice() >= key => Bound::Excluded(s.clone()),
            _ => Bound::Included(key.to_vec()),
        };
        self.position_at(from)
    }

    fn seek_first(&mut self) -> CursorResult {
        self.position_at(self.start.clone())
    }

    fn next(&mut self) -> CursorResult {
        match self.state {
            CursorState::Unpositioned => self.seek_first(),
            CursorState::Exhausted => Ok(None),
            CursorState::Active { more } => {
                if self.batch.is_empty() && more {
                    let last = self.current.take().map(|(k, _)| k).unwrap_or_default();
                    let more = self.load(Bound::Excluded(&last))?;
                    return self.advance(more);
                }
                self.advance(more)
            }
        }
    }

    fn current(&self) -> Option<(&[u8], &[u8])> {
        self.current.as_ref().map(|(k, v)| (k.as_slice(), v.as_slice()))
    }
}
