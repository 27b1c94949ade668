//! Serializable index metadata.

use serde::{Deserialize, Serialize};

/// Kind of secondary index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum IndexType {
    /// Endpoint index on an edge collection.
    #[default]
    Edge,
}

impl IndexType {
    /// The name used in index definitions.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Edge => "edge",
        }
    }
}

/// The persisted description of an index.
///
/// ```
/// use spindle_index::{IndexDefinition, IndexType};
///
/// let json = r#"{"type":"edge","id":"7","fields":["_from"]}"#;
/// let def: IndexDefinition = serde_json::from_str(json).unwrap();
/// assert_eq!(def.index_type, IndexType::Edge);
/// assert_eq!(def.selectivity_estimate, None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDefinition {
    /// Index kind.
    #[serde(rename = "type")]
    pub index_type: IndexType,
    /// Index id, as a string.
    pub id: String,
    /// The indexed attribute.
    pub fields: Vec<String>,
    /// Cached selectivity, in detailed definitions only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selectivity_estimate: Option<f64>,
    /// Uniqueness, in detailed definitions only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
    /// Sparseness, in detailed definitions only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sparse: Option<bool>,
}

/// Runtime figures of an index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexFigures {
    /// Bytes held in memory.
    pub memory: usize,
    /// Current selectivity estimate.
    pub selectivity_estimate: f64,
}
