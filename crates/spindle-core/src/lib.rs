//! `Spindle` Core
//!
//! This crate provides the fundamental types shared by the Spindle edge index,
//! its storage layer, and the query layer that drives it.
//!
//! # Overview
//!
//! - **Identifiers**: [`IndexId`], [`CollectionId`], [`RevisionId`] and [`DocumentKey`]
//! - **Documents**: [`Document`], an edge document with named attributes
//! - **Values**: [`Value`] for attribute values and [`DirectionValue`] for the
//!   subset of values an edge endpoint can hold
//! - **References**: [`DocumentToken`], the opaque handle an index returns per match
//!
//! # Example
//!
//! ```
//! use spindle_core::{DirectionValue, Document, DocumentKey};
//!
//! let edge = Document::new("e1")
//!     .with_attribute("_from", "vertices/v1")
//!     .with_attribute("_to", "vertices/v2");
//!
//! assert_eq!(edge.key(), &DocumentKey::new("e1"));
//! let from = DirectionValue::try_from(edge.get("_from").unwrap()).unwrap();
//! assert_eq!(from, DirectionValue::from("vertices/v1"));
//! ```
//!
//! # Modules
//!
//! - [`types`] - Core data types
//! - [`encoding`] - Encoding traits, sortable value encoding and edge index keys
//! - [`error`] - Error types ([`CoreError`])

#![deny(clippy::unwrap_used)]

pub mod encoding;
pub mod error;
pub mod types;

pub use error::CoreError;
pub use types::{
    CollectionId, DirectionValue, Document, DocumentKey, DocumentToken, IndexId, RevisionId, Value,
};
