//! Document references produced by index scans.

use serde::{Deserialize, Serialize};

use super::{DocumentKey, RevisionId};

/// Opaque reference to a stored edge document.
///
/// An index never returns documents, only tokens. The document store resolves
/// a token through its key; the revision identifies which version the index
/// entry was written for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentToken {
    /// Revision of the document version the entry was written for.
    pub revision: RevisionId,
    /// Primary key of the edge document.
    pub key: DocumentKey,
}

impl DocumentToken {
    /// Create a new token.
    #[must_use]
    pub fn new(revision: RevisionId, key: impl Into<DocumentKey>) -> Self {
        Self { revision, key: key.into() }
    }
}
