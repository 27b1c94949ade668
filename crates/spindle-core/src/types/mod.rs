//! Core data types for Spindle.
//!
//! This module defines identifiers, attribute values, edge documents and the
//! document references returned by index scans.

mod document;
mod id;
mod token;
mod value;

pub use document::{Document, FROM_ATTRIBUTE, KEY_ATTRIBUTE, TO_ATTRIBUTE};
pub use id::{CollectionId, DocumentKey, IndexId, RevisionId};
pub use token::DocumentToken;
pub use value::{DirectionValue, Value};
