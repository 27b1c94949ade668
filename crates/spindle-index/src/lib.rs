//! `Spindle` Index
//!
//! A secondary index for edge collections. It maps the value of an edge's
//! `_from` or `_to` attribute to the edges incident to that vertex, stored as
//! ordered keys in a transactional key-value store.
//!
//! # Overview
//!
//! - [`EdgeIndex`] writes and removes entries and keeps a selectivity estimate
//! - [`EdgeIndex::supports_filter_condition`] and
//!   [`EdgeIndex::specialize_condition`] let a planner decide whether to use it
//! - [`EdgeIndex::iterator_for_condition`] turns a condition into an
//!   [`IndexIterator`] producing [`DocumentToken`](spindle_core::DocumentToken)s
//!
//! Scans return document references only. Resolving them is up to the
//! document store.

#![deny(clippy::unwrap_used)]

pub mod condition;
pub mod definition;
pub mod descriptor;
mod edge_index;
pub mod error;
pub mod iterator;
pub mod search;
pub mod selectivity;

pub use condition::{FilterCosts, SpecializedCondition, SEEK_COST};
pub use definition::{IndexDefinition, IndexFigures, IndexType};
pub use descriptor::{Direction, EdgeIndexConfig, IndexDescriptor, EDGE_INDEX_TABLE};
pub use edge_index::{BatchInsertReport, EdgeIndex, TaskQueue};
pub use error::{IndexError, IndexResult};
pub use iterator::{EdgeIndexIterator, EmptyIndexIterator, IndexIterator};
pub use search::{expand_in_search_values, handle_val_node, SearchOrigin, SearchTerm, SearchValue, SearchValues};
pub use selectivity::SelectivityEstimate;
