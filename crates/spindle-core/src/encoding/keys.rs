//! Key encoding for edge index entries.
//!
//! Every entry of an edge index is a single key with the revision id as value:
//!
//! ```text
//! [PREFIX_EDGE_INDEX][index_id: u64 BE][sortable direction value][escaped document key]
//! ```
//!
//! - `index_id` keeps indexes that share a physical table apart
//! - the direction value uses the [`sortable`](super::sortable) encoding
//! - the document key uses the null-escaped byte form with its terminator
//!
//! Because both variable-length parts are prefix-free, keys sort by index id,
//! then direction value, then document key, and all entries for one endpoint
//! form a single contiguous range starting at [`encode_edge_index_prefix`].
//!
//! # Example
//!
//! ```
//! use spindle_core::encoding::keys::{
//!     decode_edge_index_key, encode_edge_index_key, encode_edge_index_prefix,
//! };
//! use spindle_core::{DirectionValue, DocumentKey, IndexId};
//!
//! let index = IndexId::new(7);
//! let from = DirectionValue::from("vertices/v1");
//! let key = encode_edge_index_key(index, &from, &DocumentKey::new("e1"));
//!
//! assert!(key.starts_with(&encode_edge_index_prefix(index, &from)));
//! let (value, doc) = decode_edge_index_key(index, &key).unwrap();
//! assert_eq!(value, from);
//! assert_eq!(doc.as_str(), "e1");
//! ```

use std::ops::Bound;

use super::sortable::{
    decode_bytes_escaped, decode_direction_value_with_len, encode_bytes_escaped,
    encode_direction_value_to, encoded_len,
};
use crate::error::CoreError;
use crate::types::{DirectionValue, DocumentKey, IndexId};

/// Key prefix for edge index entries.
pub const PREFIX_EDGE_INDEX: u8 = 0x08;

const HEADER_LEN: usize = 1 + 8;

#[inline]
fn push_header(index_id: IndexId, key: &mut Vec<u8>) {
    key.push(PREFIX_EDGE_INDEX);
    key.extend_from_slice(&index_id.as_u64().to_be_bytes());
}

/// Encode the stored key for one edge.
#[must_use]
pub fn encode_edge_index_key(
    index_id: IndexId,
    value: &DirectionValue,
    document: &DocumentKey,
) -> Vec<u8> {
    let doc = document.as_str().as_bytes();
    let mut key = Vec::with_capacity(HEADER_LEN + encoded_len(value) + doc.len() + 2);
    push_header(index_id, &mut key);
    encode_direction_value_to(value, &mut key);
    encode_bytes_escaped(doc, &mut key);
    key
}

/// Encode the prefix shared by all entries for one direction value.
#[must_use]
pub fn encode_edge_index_prefix(index_id: IndexId, value: &DirectionValue) -> Vec<u8> {
    let mut key = Vec::with_capacity(HEADER_LEN + encoded_len(value));
    push_header(index_id, &mut key);
    encode_direction_value_to(value, &mut key);
    key
}

/// Encode the prefix shared by every entry of an index.
#[inline]
#[must_use]
pub fn encode_edge_index_id_prefix(index_id: IndexId) -> Vec<u8> {
    let mut key = Vec::with_capacity(HEADER_LEN);
    push_header(index_id, &mut key);
    key
}

/// Decode a stored key back into its direction value and document key.
///
/// Fails on any input that [`encode_edge_index_key`] would not produce for
/// `index_id`, including keys of other indexes.
pub fn decode_edge_index_key(
    index_id: IndexId,
    key: &[u8],
) -> Result<(DirectionValue, DocumentKey), CoreError> {
    let header = key
        .get(..HEADER_LEN)
        .ok_or_else(|| CoreError::Encoding(format!("edge index key too short: {} bytes", key.len())))?;
    if header[0] != PREFIX_EDGE_INDEX {
        return Err(CoreError::Encoding(format!("not an edge index key: prefix {:#x}", header[0])));
    }
    if header[1..] != index_id.as_u64().to_be_bytes() {
        return Err(CoreError::Encoding(format!("edge index key does not belong to index {index_id}")));
    }

    let rest = &key[HEADER_LEN..];
    let (value, used) = decode_direction_value_with_len(rest)?;
    let (doc, doc_used) = decode_bytes_escaped(&rest[used..])?;
    if used + doc_used != rest.len() {
        return Err(CoreError::Encoding("trailing bytes after edge index key".into()));
    }
    let doc = String::from_utf8(doc)
        .map_err(|e| CoreError::Encoding(format!("invalid UTF-8 in document key: {e}")))?;

    Ok((value, DocumentKey::new(doc)))
}

/// Smallest key greater than every key starting with `prefix`.
///
/// Returns `None` when no such key exists, which only happens when the prefix
/// is empty or consists solely of `0xFF` bytes.
#[must_use]
pub fn prefix_successor(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < 0xFF {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

/// Range bounds covering exactly the keys that start with `prefix`.
#[must_use]
pub fn prefix_bounds(prefix: &[u8]) -> (Bound<Vec<u8>>, Bound<Vec<u8>>) {
    let end = prefix_successor(prefix).map_or(Bound::Unbounded, Bound::Excluded);
    (Bound::Included(prefix.to_vec()), end)
}

/// Range bounds covering every entry of an index.
#[must_use]
pub fn edge_index_bounds(index_id: IndexId) -> (Bound<Vec<u8>>, Bound<Vec<u8>>) {
    prefix_bounds(&encode_edge_index_id_prefix(index_id))
}

/// Range bounds covering every entry for one direction value.
#[must_use]
pub fn edge_index_value_bounds(
    index_id: IndexId,
    value: &DirectionValue,
) -> (Bound<Vec<u8>>, Bound<Vec<u8>>) {
    prefix_bounds(&encode_edge_index_prefix(index_id, value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn contains(bounds: &(Bound<Vec<u8>>, Bound<Vec<u8>>), key: &[u8]) -> bool {
        let lower = match &bounds.0 {
            Bound::Included(b) => key >= b.as_slice(),
            Bound::Excluded(b) => key > b.as_slice(),
            Bound::Unbounded => true,
        };
        let upper = match &bounds.1 {
            Bound::Included(b) => key <= b.as_slice(),
            Bound::Excluded(b) => key < b.as_slice(),
            Bound::Unbounded => true,
        };
        lower && upper
    }

    #[test]
    fn key_layout() {
        let key = encode_edge_index_key(IndexId::new(1), &DirectionValue::from("v"), &"e".into());
        assert_eq!(
            key,
            vec![PREFIX_EDGE_INDEX, 0, 0, 0, 0, 0, 0, 0, 1, 0x04, b'v', 0, 0, b'e', 0, 0]
        );
    }

    #[test]
    fn decode_rejects_other_index() {
        let key = encode_edge_index_key(IndexId::new(1), &DirectionValue::from("v"), &"e".into());
        assert!(decode_edge_index_key(IndexId::new(2), &key).is_err());
        assert!(decode_edge_index_key(IndexId::new(1), &key).is_ok());
    }

    #[test]
    fn decode_rejects_malformed_keys() {
        let id = IndexId::new(1);
        let good = encode_edge_index_key(id, &DirectionValue::from(5), &"e".into());
        // truncated at every position
        for cut in 0..good.len() {
            assert!(decode_edge_index_key(id, &good[..cut]).is_err(), "cut at {cut}");
        }
        let mut trailing = good.clone();
        trailing.push(0x61);
        assert!(decode_edge_index_key(id, &trailing).is_err());

        let mut wrong_prefix = good;
        wrong_prefix[0] = 0x07;
        assert!(decode_edge_index_key(id, &wrong_prefix).is_err());
    }

    #[test]
    fn value_bounds_are_exact() {
        let id = IndexId::new(3);
        let v1 = DirectionValue::from("v1");
        let bounds = edge_index_value_bounds(id, &v1);

        assert!(contains(&bounds, &encode_edge_index_key(id, &v1, &"".into())));
        assert!(contains(&bounds, &encode_edge_index_key(id, &v1, &"\u{10FFFF}".into())));
        assert!(!contains(&bounds, &encode_edge_index_key(id, &"v10".into(), &"e".into())));
        assert!(!contains(&bounds, &encode_edge_index_key(id, &"v".into(), &"e".into())));
        assert!(!contains(&bounds, &encode_edge_index_key(IndexId::new(4), &v1, &"e".into())));
    }

    #[test]
    fn index_bounds_cover_only_own_index() {
        let bounds = edge_index_bounds(IndexId::new(9));
        let own = encode_edge_index_key(IndexId::new(9), &DirectionValue::Int(i64::MAX), &"z".into());
        let next = encode_edge_index_key(IndexId::new(10), &DirectionValue::Int(0), &"a".into());
        assert!(contains(&bounds, &own));
        assert!(!contains(&bounds, &next));
    }

    #[test]
    fn successor_carries() {
        assert_eq!(prefix_successor(&[0x01, 0x02]), Some(vec![0x01, 0x03]));
        assert_eq!(prefix_successor(&[0x01, 0xFF]), Some(vec![0x02]));
        assert_eq!(prefix_successor(&[0xFF, 0xFF]), None);
        assert_eq!(prefix_successor(&[]), None);
    }

    #[test]
    fn max_index_id_is_bounded() {
        let (_, end) = edge_index_bounds(IndexId::new(u64::MAX));
        assert_eq!(end, Bound::Excluded(vec![PREFIX_EDGE_INDEX + 1]));
    }
}
