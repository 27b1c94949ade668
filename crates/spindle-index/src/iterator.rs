//! Pull iterators over edge index scans.

use spindle_core::encoding::keys::{decode_edge_index_key, edge_index_value_bounds};
use spindle_core::encoding::Decoder;
use spindle_core::{DocumentToken, IndexId, RevisionId};
use spindle_storage::{Cursor, Transaction};
use tracing::trace;

use crate::error::{IndexError, IndexResult};
use crate::search::SearchValues;
use crate::selectivity::borrowed_bound;

/// A resumable source of document tokens.
pub trait IndexIterator {
    /// Short name of the iterator kind.
    fn type_name(&self) -> &'static str;

    /// Feed up to `limit` tokens to `callback`.
    ///
    /// Stops early when the callback returns `false`. Returns `true` if more
    /// tokens may follow and `false` once the iterator is drained.
    fn next(&mut self, callback: &mut dyn FnMut(DocumentToken) -> bool, limit: usize) -> IndexResult<bool>;

    /// Rewind to the first token.
    fn reset(&mut self);

    /// Drain every remaining token.
    fn collect_remaining(&mut self) -> IndexResult<Vec<DocumentToken>> {
        let mut tokens = Vec::new();
        while self.next(
            &mut |token| {
                tokens.push(token);
                true
            },
            usize::MAX,
        )? {}
        Ok(tokens)
    }
}

/// Iterator that never yields anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyIndexIterator;

impl IndexIterator for EmptyIndexIterator {
    fn type_name(&self) -> &'static str {
        "empty-index-iterator"
    }

    fn next(&mut self, _callback: &mut dyn FnMut(DocumentToken) -> bool, _limit: usize) -> IndexResult<bool> {
        Ok(false)
    }

    fn reset(&mut self) {}
}

/// Scans one prefix range per search value, in search value order.
///
/// Within a value, tokens come in document key order.
pub struct EdgeIndexIterator<'t, T: Transaction + 't> {
    tx: &'t T,
    table: String,
    index_id: IndexId,
    values: SearchValues,
    position: usize,
    cursor: Option<T::Cursor<'t>>,
}

impl<'t, T: Transaction + 't> EdgeIndexIterator<'t, T> {
    /// Create an iterator over `values`.
    pub fn new(tx: &'t T, table: impl Into<String>, index_id: IndexId, values: SearchValues) -> Self {
        Self { tx, table: table.into(), index_id, values, position: 0, cursor: None }
    }

    /// Create an iterator from an encoded [`SearchValues`] buffer.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::IteratorConstruction`] if the buffer is malformed.
    pub fn from_buffer(
        tx: &'t T,
        table: impl Into<String>,
        index_id: IndexId,
        buffer: &[u8],
    ) -> IndexResult<Self> {
        let values = SearchValues::decode(buffer)
            .map_err(|e| IndexError::IteratorConstruction(e.to_string()))?;
        Ok(Self::new(tx, table, index_id, values))
    }

    /// The search values this iterator walks.
    pub fn search_values(&self) -> &SearchValues {
        &self.values
    }

    fn open_cursor(&self) -> IndexResult<T::Cursor<'t>> {
        let tx: &'t T = self.tx;
        let (start, end) = edge_index_value_bounds(self.index_id, &self.values[self.position].value);
        Ok(tx.range(&self.table, borrowed_bound(&start), borrowed_bound(&end))?)
    }
}

impl<'t, T: Transaction + 't> IndexIterator for EdgeIndexIterator<'t, T> {
    fn type_name(&self) -> &'static str {
        "edge-index-iterator"
    }

    fn next(&mut self, callback: &mut dyn FnMut(DocumentToken) -> bool, limit: usize) -> IndexResult<bool> {
        if limit == 0 {
            return Ok(self.position < self.values.len());
        }

        let mut produced = 0;
        while self.position < self.values.len() {
            if self.cursor.is_none() {
                self.cursor = Some(self.open_cursor()?);
            }
            let index_id = self.index_id;
            if let Some(cursor) = self.cursor.as_mut() {
                while let Some((key, value)) = cursor.next()? {
                    let token = decode_token(index_id, &key, &value)?;
                    produced += 1;
                    if !callback(token) || produced >= limit {
                        return Ok(true);
                    }
                }
            }
            trace!(index = %index_id, position = self.position, "search value drained");
            self.cursor = None;
            self.position += 1;
        }
        Ok(false)
    }

    fn reset(&mut self) {
        self.cursor = None;
        self.position = 0;
    }
}

fn decode_token(index_id: IndexId, key: &[u8], value: &[u8]) -> IndexResult<DocumentToken> {
    let (_, doc_key) = decode_edge_index_key(index_id, key)
        .map_err(|e| IndexError::Corruption(format!("bad key in index {index_id}: {e}")))?;
    let revision: [u8; 8] = value.try_into().map_err(|_| {
        IndexError::Corruption(format!(
            "revision for {doc_key} in index {index_id} has {} bytes",
            value.len()
        ))
    })?;
    Ok(DocumentToken::new(RevisionId::new(u64::from_be_bytes(revision)), doc_key))
}
