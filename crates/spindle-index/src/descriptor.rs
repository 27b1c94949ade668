//! Index identity and configuration.

use serde::{Deserialize, Serialize};
use spindle_core::types::{FROM_ATTRIBUTE, TO_ATTRIBUTE};
use spindle_core::{CollectionId, IndexId};

/// Logical table holding the entries of every edge index.
///
/// Entries of different indexes are kept apart by the index id key prefix.
pub const EDGE_INDEX_TABLE: &str = "edge_index";

/// The endpoint an edge index is built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// The source vertex (`_from`).
    From,
    /// The target vertex (`_to`).
    To,
}

impl Direction {
    /// The document attribute holding this endpoint.
    #[must_use]
    pub const fn attribute(self) -> &'static str {
        match self {
            Self::From => FROM_ATTRIBUTE,
            Self::To => TO_ATTRIBUTE,
        }
    }
}

/// Immutable identity of one edge index instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexDescriptor {
    id: IndexId,
    collection: CollectionId,
    direction_attribute: String,
}

impl IndexDescriptor {
    /// Describe an index over an arbitrary direction attribute.
    #[must_use]
    pub fn new(id: IndexId, collection: CollectionId, direction_attribute: impl Into<String>) -> Self {
        Self { id, collection, direction_attribute: direction_attribute.into() }
    }

    /// Describe an index over one of the standard endpoints.
    #[must_use]
    pub fn for_direction(id: IndexId, collection: CollectionId, direction: Direction) -> Self {
        Self::new(id, collection, direction.attribute())
    }

    /// The index id.
    #[must_use]
    pub const fn id(&self) -> IndexId {
        self.id
    }

    /// The owning collection.
    #[must_use]
    pub const fn collection(&self) -> CollectionId {
        self.collection
    }

    /// Name of the indexed endpoint attribute.
    #[must_use]
    pub fn direction_attribute(&self) -> &str {
        &self.direction_attribute
    }

    /// Approximate heap footprint in bytes.
    pub(crate) fn heap_size(&self) -> usize {
        self.direction_attribute.capacity()
    }
}

/// Tuning knobs for an edge index.
///
/// ```
/// use spindle_index::EdgeIndexConfig;
///
/// let config = EdgeIndexConfig::new().default_selectivity(0.25).selectivity_sample_size(500);
/// assert_eq!(config.selectivity_sample_size, 500);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EdgeIndexConfig {
    /// Estimate reported before the first recompute. Always in `(0, 1]`.
    pub default_selectivity: f64,
    /// Maximum number of entries read by one selectivity recompute.
    pub selectivity_sample_size: usize,
}

impl EdgeIndexConfig {
    /// Assume every endpoint is distinct until measured.
    pub const DEFAULT_SELECTIVITY: f64 = 1.0;
    /// Entries sampled per recompute.
    pub const DEFAULT_SAMPLE_SIZE: usize = 10_000;

    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the estimate reported before the first recompute.
    ///
    /// Values outside `(0, 1]` are clamped; NaN falls back to the default.
    #[must_use]
    pub fn default_selectivity(mut self, estimate: f64) -> Self {
        self.default_selectivity = if estimate.is_nan() {
            Self::DEFAULT_SELECTIVITY
        } else {
            estimate.clamp(f64::MIN_POSITIVE, 1.0)
        };
        self
    }

    /// Set the maximum number of entries sampled per recompute.
    #[must_use]
    pub const fn selectivity_sample_size(mut self, entries: usize) -> Self {
        self.selectivity_sample_size = entries;
        self
    }
}

impl Default for EdgeIndexConfig {
    fn default() -> Self {
        Self {
            default_selectivity: Self::DEFAULT_SELECTIVITY,
            selectivity_sample_size: Self::DEFAULT_SAMPLE_SIZE,
        }
    }
}
