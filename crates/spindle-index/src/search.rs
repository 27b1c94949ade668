//! Search values: the expanded list of keys an iterator walks.
//!
//! A [`SearchValues`] sequence keeps appearance order and duplicates. It can
//! be encoded into a self-describing buffer so an iterator can be rebuilt
//! from it:
//!
//! ```text
//! [FORMAT_VERSION][count: u32 BE]{[origin: u8][sortable direction value]}*
//! ```

use std::ops::Index;

use spindle_core::encoding::sortable::{decode_direction_value_with_len, encode_direction_value_to};
use spindle_core::encoding::{Decoder, Encoder, FORMAT_VERSION};
use spindle_core::{CoreError, DirectionValue};
use spindle_query::{Expr, Literal};

/// How a search value entered the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchOrigin {
    /// From `attr == value`.
    Equality,
    /// From one element of `attr IN [...]`.
    InList,
}

impl SearchOrigin {
    const fn as_byte(self) -> u8 {
        match self {
            Self::Equality => 0,
            Self::InList => 1,
        }
    }

    fn from_byte(byte: u8) -> Result<Self, CoreError> {
        match byte {
            0 => Ok(Self::Equality),
            1 => Ok(Self::InList),
            other => Err(CoreError::Encoding(format!("unknown search origin: {other}"))),
        }
    }
}

/// One looked-up value of an edge index scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchValue {
    /// The direction value to look up.
    pub value: DirectionValue,
    /// Where the value came from.
    pub origin: SearchOrigin,
}

impl SearchValue {
    /// Create a search value.
    pub fn new(value: impl Into<DirectionValue>, origin: SearchOrigin) -> Self {
        Self { value: value.into(), origin }
    }
}

/// An ordered list of search values, duplicates included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchValues {
    values: Vec<SearchValue>,
}

impl SearchValues {
    /// Create an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Append a search value.
    pub fn push(&mut self, value: SearchValue) {
        self.values.push(value);
    }

    /// Number of search values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no search values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Search value at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&SearchValue> {
        self.values.get(index)
    }

    /// Iterate over the search values in order.
    pub fn iter(&self) -> std::slice::Iter<'_, SearchValue> {
        self.values.iter()
    }

    /// Iterate over the bare direction values in order.
    pub fn direction_values(&self) -> impl Iterator<Item = &DirectionValue> {
        self.values.iter().map(|v| &v.value)
    }
}

impl Index<usize> for SearchValues {
    type Output = SearchValue;

    fn index(&self, index: usize) -> &SearchValue {
        &self.values[index]
    }
}

impl From<Vec<SearchValue>> for SearchValues {
    fn from(values: Vec<SearchValue>) -> Self {
        Self { values }
    }
}

impl FromIterator<SearchValue> for SearchValues {
    fn from_iter<I: IntoIterator<Item = SearchValue>>(iter: I) -> Self {
        Self { values: iter.into_iter().collect() }
    }
}

impl IntoIterator for SearchValues {
    type Item = SearchValue;
    type IntoIter = std::vec::IntoIter<SearchValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a> IntoIterator for &'a SearchValues {
    type Item = &'a SearchValue;
    type IntoIter = std::slice::Iter<'a, SearchValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl Encoder for SearchValues {
    fn encode_to(&self, buf: &mut Vec<u8>) -> Result<(), CoreError> {
        let count = u32::try_from(self.values.len())
            .map_err(|_| CoreError::Encoding(format!("too many search values: {}", self.values.len())))?;
        buf.push(FORMAT_VERSION);
        buf.extend_from_slice(&count.to_be_bytes());
        for value in &self.values {
            buf.push(value.origin.as_byte());
            encode_direction_value_to(&value.value, buf);
        }
        Ok(())
    }
}

impl Decoder for SearchValues {
    fn decode(bytes: &[u8]) -> Result<Self, CoreError> {
        let (&version, rest) =
            bytes.split_first().ok_or_else(|| CoreError::Encoding("empty search value buffer".into()))?;
        if version != FORMAT_VERSION {
            return Err(CoreError::Encoding(format!("unsupported format version: {version}")));
        }
        let count_bytes: [u8; 4] = rest
            .get(..4)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| CoreError::Encoding("search value buffer truncated in count".into()))?;
        let count = u32::from_be_bytes(count_bytes) as usize;

        let mut pos = 4;
        // the count is untrusted; every entry takes at least two bytes
        let mut values = Vec::with_capacity(count.min(rest.len() / 2));
        for _ in 0..count {
            let origin = rest
                .get(pos)
                .copied()
                .ok_or_else(|| CoreError::Encoding("search value buffer truncated".into()))
                .and_then(SearchOrigin::from_byte)?;
            let (value, used) = decode_direction_value_with_len(&rest[pos + 1..])?;
            values.push(SearchValue { value, origin });
            pos += 1 + used;
        }
        if pos != rest.len() {
            return Err(CoreError::Encoding(format!(
                "{} trailing bytes after search values",
                rest.len() - pos
            )));
        }
        Ok(Self { values })
    }
}

/// A compiled search value source: one equality operand or one IN list.
#[derive(Debug, Clone, Copy)]
pub enum SearchTerm<'a> {
    /// The value side of `attr == value`.
    Eq(&'a Expr),
    /// The elements of `attr IN [...]`.
    In(&'a [Expr]),
}

/// Expand terms into search values, keeping order and duplicates.
///
/// Elements that cannot be looked up are skipped, see [`handle_val_node`].
#[must_use]
pub fn expand_in_search_values(terms: &[SearchTerm<'_>]) -> SearchValues {
    let mut out = SearchValues::new();
    for term in terms {
        match term {
            SearchTerm::Eq(node) => handle_val_node(&mut out, node, SearchOrigin::Equality),
            SearchTerm::In(list) => {
                for node in *list {
                    handle_val_node(&mut out, node, SearchOrigin::InList);
                }
            }
        }
    }
    out
}

/// Append the search value for a value node.
///
/// Non-empty strings and integers, as literals or bound parameters, are
/// appended. Anything else, arrays included, matches no edge and is skipped.
pub fn handle_val_node(out: &mut SearchValues, node: &Expr, origin: SearchOrigin) {
    if let Some(literal) = node.constant_value() {
        push_literal(out, literal, origin);
    }
}

fn push_literal(out: &mut SearchValues, literal: &Literal, origin: SearchOrigin) {
    match literal {
        Literal::String(s) if !s.is_empty() => out.push(SearchValue::new(s.as_str(), origin)),
        Literal::Integer(i) => out.push(SearchValue::new(*i, origin)),
        Literal::Null | Literal::Boolean(_) | Literal::Float(_) | Literal::String(_) | Literal::Array(_) => {
            tracing::trace!(value = ?literal, "skipping unsearchable value");
        }
    }
}

/// Number of search values a value node would produce.
pub(crate) fn search_value_count(node: &Expr, origin: SearchOrigin) -> usize {
    let mut values = SearchValues::new();
    handle_val_node(&mut values, node, origin);
    values.len()
}
