//! Edge documents.
//!
//! A [`Document`] is the in-memory form of a stored edge: a primary key plus a
//! map of named attributes, two of which (`_from` and `_to`) name the
//! endpoints.
//!
//! # Example
//!
//! ```
//! use spindle_core::types::{Document, FROM_ATTRIBUTE};
//!
//! let edge = Document::new("e1")
//!     .with_attribute(FROM_ATTRIBUTE, "vertices/v1")
//!     .with_attribute("weight", 3i64);
//!
//! assert_eq!(edge.get(FROM_ATTRIBUTE).and_then(|v| v.as_str()), Some("vertices/v1"));
//! assert!(edge.get("_to").is_none());
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{DocumentKey, Value};

/// Attribute naming the source vertex of an edge.
pub const FROM_ATTRIBUTE: &str = "_from";

/// Attribute naming the target vertex of an edge.
pub const TO_ATTRIBUTE: &str = "_to";

/// Attribute holding the primary key of a document.
pub const KEY_ATTRIBUTE: &str = "_key";

/// A stored document with its primary key and attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    key: DocumentKey,
    attributes: HashMap<String, Value>,
}

impl Document {
    /// Create a document with the given key and no attributes.
    #[must_use]
    pub fn new(key: impl Into<DocumentKey>) -> Self {
        Self { key: key.into(), attributes: HashMap::new() }
    }

    /// Add an attribute, replacing any previous value under the same name.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Set an attribute in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// The document's primary key.
    #[inline]
    #[must_use]
    pub fn key(&self) -> &DocumentKey {
        &self.key
    }

    /// Look up an attribute by name. The primary key is not an attribute.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Iterate over all attributes.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }
}
