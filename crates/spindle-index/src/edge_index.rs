//! The edge index: maps an endpoint attribute to the edges incident to it.
//!
//! Every edge document produces one entry
//! `(index id, endpoint value, document key) -> revision`. Lookups for one
//! endpoint are prefix scans over `(index id, endpoint value)`.

use std::mem;
use std::sync::{PoisonError, RwLock};

use spindle_core::encoding::keys::encode_edge_index_key;
use spindle_core::{DirectionValue, Document, DocumentKey, IndexId, RevisionId};
use spindle_query::{Expr, Variable};
use spindle_storage::Transaction;
use tracing::{debug, trace, warn};

use crate::condition::{self, FilterCosts, SpecializedCondition};
use crate::definition::{IndexDefinition, IndexFigures, IndexType};
use crate::descriptor::{EdgeIndexConfig, IndexDescriptor, EDGE_INDEX_TABLE};
use crate::error::{IndexError, IndexResult};
use crate::iterator::{EdgeIndexIterator, EmptyIndexIterator, IndexIterator};
use crate::search::{expand_in_search_values, SearchTerm};
use crate::selectivity::{sample_index, SelectivityEstimate};

/// Executor that batch operations may hand work to.
pub trait TaskQueue: Send + Sync {
    /// Schedule `task` for execution.
    fn dispatch(&self, task: Box<dyn FnOnce() + Send>);
}

/// Outcome of [`EdgeIndex::batch_insert`].
#[derive(Debug, Default)]
pub struct BatchInsertReport {
    /// Documents indexed.
    pub inserted: usize,
    /// Documents rejected, with the reason, in submission order.
    pub failures: Vec<(DocumentKey, IndexError)>,
}

impl BatchInsertReport {
    /// Returns `true` if every document was indexed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Secondary index over the `_from` or `_to` attribute of an edge collection.
///
/// All operations take the transaction explicitly. The only interior state
/// is the cached selectivity estimate.
///
/// # Example
///
/// ```
/// use spindle_core::{CollectionId, Document, IndexId, RevisionId};
/// use spindle_index::{Direction, EdgeIndex, IndexDescriptor, IndexIterator};
/// use spindle_query::{Expr, Variable};
/// use spindle_storage::backends::RedbEngine;
/// use spindle_storage::StorageEngine;
///
/// let engine = RedbEngine::in_memory()?;
/// let index = EdgeIndex::new(IndexDescriptor::for_direction(
///     IndexId::new(1),
///     CollectionId::new(1),
///     Direction::From,
/// ));
///
/// let mut tx = engine.begin_write()?;
/// let edge = Document::new("e1").with_attribute("_from", "v/1").with_attribute("_to", "v/2");
/// index.insert(&mut tx, RevisionId::new(1), &edge, false)?;
///
/// let e = Variable::new(0, "e");
/// let cond = Expr::attribute(&e, "_from").eq(Expr::string("v/1"));
/// let mut it = index.iterator_for_condition(&tx, &cond, &e)?;
/// let tokens = it.collect_remaining()?;
/// assert_eq!(tokens[0].key.as_str(), "e1");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct EdgeIndex {
    descriptor: IndexDescriptor,
    config: EdgeIndexConfig,
    selectivity: RwLock<Option<SelectivityEstimate>>,
}

impl EdgeIndex {
    /// Create an index with the default configuration.
    #[must_use]
    pub fn new(descriptor: IndexDescriptor) -> Self {
        Self::with_config(descriptor, EdgeIndexConfig::default())
    }

    /// Create an index with a custom configuration.
    #[must_use]
    pub fn with_config(descriptor: IndexDescriptor, config: EdgeIndexConfig) -> Self {
        Self { descriptor, config, selectivity: RwLock::new(None) }
    }

    /// The index identity.
    #[must_use]
    pub const fn descriptor(&self) -> &IndexDescriptor {
        &self.descriptor
    }

    /// The index configuration.
    #[must_use]
    pub const fn config(&self) -> &EdgeIndexConfig {
        &self.config
    }

    /// The index id.
    #[must_use]
    pub const fn id(&self) -> IndexId {
        self.descriptor.id()
    }

    // ========== Properties ==========

    /// Short name of the index kind.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        "edge"
    }

    /// The index kind.
    #[must_use]
    pub const fn index_type(&self) -> IndexType {
        IndexType::Edge
    }

    /// Edge indexes never expand array attributes.
    #[must_use]
    pub const fn allow_expansion(&self) -> bool {
        false
    }

    /// Edge indexes are part of every edge collection.
    #[must_use]
    pub const fn can_be_dropped(&self) -> bool {
        false
    }

    /// Scans are ordered per search value only.
    #[must_use]
    pub const fn is_sorted(&self) -> bool {
        false
    }

    /// A selectivity estimate is always available.
    #[must_use]
    pub const fn has_selectivity_estimate(&self) -> bool {
        true
    }

    /// Batch inserts are plain sequential inserts.
    #[must_use]
    pub const fn has_batch_insert(&self) -> bool {
        false
    }

    // ========== Mutation ==========

    /// Index one edge document.
    ///
    /// Re-inserting an existing entry overwrites it with the same key, so
    /// replays after a rollback are harmless.
    ///
    /// # Errors
    ///
    /// [`IndexError::NotIndexable`] if the direction attribute is missing or
    /// is not a string or integer; storage errors otherwise.
    pub fn insert<T: Transaction>(
        &self,
        tx: &mut T,
        revision: RevisionId,
        document: &Document,
        is_rollback: bool,
    ) -> IndexResult<()> {
        let key = self.entry_key(document)?;
        tx.put(EDGE_INDEX_TABLE, &key, &revision.to_be_bytes())?;
        trace!(index = %self.id(), key = %document.key(), %revision, is_rollback, "indexed edge");
        Ok(())
    }

    /// Remove the entry of one edge document.
    ///
    /// A missing entry is not an error. During rollback an unindexable
    /// document is skipped, since it never had an entry.
    pub fn remove<T: Transaction>(
        &self,
        tx: &mut T,
        revision: RevisionId,
        document: &Document,
        is_rollback: bool,
    ) -> IndexResult<()> {
        let key = match self.entry_key(document) {
            Ok(key) => key,
            Err(err) if is_rollback && err.is_per_document() => {
                warn!(index = %self.id(), error = %err, "skipping unindexable document during rollback");
                return Ok(());
            }
            Err(err) => return Err(err),
        };
        if tx.delete(EDGE_INDEX_TABLE, &key)? {
            trace!(index = %self.id(), key = %document.key(), %revision, "removed edge");
        } else {
            debug!(index = %self.id(), key = %document.key(), %revision, "edge index entry already absent");
        }
        Ok(())
    }

    /// Index many documents in submission order.
    ///
    /// Unindexable documents are reported and skipped; any other error
    /// aborts the batch. The queue is not used; inserts run on the calling
    /// thread.
    pub fn batch_insert<T: Transaction>(
        &self,
        tx: &mut T,
        documents: &[(RevisionId, Document)],
        queue: Option<&dyn TaskQueue>,
    ) -> IndexResult<BatchInsertReport> {
        if queue.is_some() {
            trace!(index = %self.id(), "task queue ignored, inserting sequentially");
        }
        self.size_hint(tx, documents.len())?;

        let mut report = BatchInsertReport::default();
        for (revision, document) in documents {
            match self.insert(tx, *revision, document, false) {
                Ok(()) => report.inserted += 1,
                Err(err) if err.is_per_document() => report.failures.push((document.key().clone(), err)),
                Err(err) => return Err(err),
            }
        }
        debug!(
            index = %self.id(),
            inserted = report.inserted,
            failed = report.failures.len(),
            "batch insert finished"
        );
        Ok(report)
    }

    /// Announce that about `expected` entries will be written.
    pub fn size_hint<T: Transaction>(&self, tx: &mut T, expected: usize) -> IndexResult<()> {
        trace!(index = %self.id(), expected, "size hint");
        tx.reserve(expected)?;
        Ok(())
    }

    /// Drop cached state. The stored entries are untouched.
    pub fn unload(&self) -> IndexResult<()> {
        *self.selectivity.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }

    /// Approximate bytes held in memory by this index object.
    #[must_use]
    pub fn memory(&self) -> usize {
        mem::size_of::<Self>() + self.descriptor.heap_size()
    }

    // ========== Selectivity ==========

    /// The cached selectivity estimate, or the configured default.
    ///
    /// Never touches the store. The hint is accepted for callers that know
    /// the looked-up value; the estimate is index-wide.
    #[must_use]
    pub fn selectivity_estimate(&self, _hint: Option<&DirectionValue>) -> f64 {
        self.selectivity().estimate
    }

    /// The cached estimate with its timestamp.
    #[must_use]
    pub fn selectivity(&self) -> SelectivityEstimate {
        let cached = *self.selectivity.read().unwrap_or_else(PoisonError::into_inner);
        cached.unwrap_or(SelectivityEstimate::assumed(self.config.default_selectivity))
    }

    /// Measure selectivity from a bounded sample and cache the result.
    pub fn recompute_selectivity<T: Transaction>(&self, tx: &T) -> IndexResult<SelectivityEstimate> {
        let sample = sample_index(tx, EDGE_INDEX_TABLE, self.id(), self.config.selectivity_sample_size)?;
        let estimate = SelectivityEstimate::measured(sample.ratio());
        *self.selectivity.write().unwrap_or_else(PoisonError::into_inner) = Some(estimate);
        debug!(index = %self.id(), estimate = estimate.estimate, "selectivity recomputed");
        Ok(estimate)
    }

    // ========== Metadata ==========

    /// The index definition. `detailed` adds the estimate and flags.
    #[must_use]
    pub fn to_definition(&self, detailed: bool) -> IndexDefinition {
        IndexDefinition {
            index_type: self.index_type(),
            id: self.id().to_string(),
            fields: vec![self.descriptor.direction_attribute().to_string()],
            selectivity_estimate: detailed.then(|| self.selectivity_estimate(None)),
            unique: detailed.then_some(false),
            sparse: detailed.then_some(false),
        }
    }

    /// Runtime figures.
    #[must_use]
    pub fn to_figures(&self) -> IndexFigures {
        IndexFigures { memory: self.memory(), selectivity_estimate: self.selectivity_estimate(None) }
    }

    /// [`EdgeIndex::to_definition`] as JSON.
    pub fn to_definition_json(&self, detailed: bool) -> IndexResult<serde_json::Value> {
        Ok(serde_json::to_value(self.to_definition(detailed))?)
    }

    /// [`EdgeIndex::to_figures`] as JSON.
    pub fn to_figures_json(&self) -> IndexResult<serde_json::Value> {
        Ok(serde_json::to_value(self.to_figures())?)
    }

    // ========== Query integration ==========

    /// Check whether this index can serve `node` for `variable`, and at what cost.
    ///
    /// `items_in_index` is the number of entries in the index.
    #[must_use]
    pub fn supports_filter_condition(
        &self,
        node: &Expr,
        variable: &Variable,
        items_in_index: usize,
    ) -> Option<FilterCosts> {
        condition::supports_filter_condition(
            node,
            variable,
            self.descriptor.direction_attribute(),
            items_in_index,
            self.selectivity_estimate(None),
        )
    }

    /// Split `node` into the part this index serves and the remainder.
    #[must_use]
    pub fn specialize_condition(&self, node: Expr, variable: &Variable) -> Option<SpecializedCondition> {
        condition::specialize_condition(node, variable, self.descriptor.direction_attribute())
    }

    /// Iterator over the edges whose direction attribute equals `value`.
    pub fn create_eq_iterator<'t, T: Transaction + 't>(&self, tx: &'t T, value: &Expr) -> EdgeIndexIterator<'t, T> {
        self.iterator_over(tx, &[SearchTerm::Eq(value)])
    }

    /// Iterator over the edges whose direction attribute is in `list`.
    pub fn create_in_iterator<'t, T: Transaction + 't>(&self, tx: &'t T, list: &[Expr]) -> EdgeIndexIterator<'t, T> {
        self.iterator_over(tx, &[SearchTerm::In(list)])
    }

    /// Compile a specialized condition into an iterator.
    ///
    /// A condition whose values match no edge yields an empty iterator.
    ///
    /// # Errors
    ///
    /// [`IndexError::IteratorConstruction`] if `node` is not an equality, IN
    /// list or OR of those on the direction attribute. Conditions accepted by
    /// [`EdgeIndex::supports_filter_condition`] that contain an AND must be
    /// passed through [`EdgeIndex::specialize_condition`] first.
    pub fn iterator_for_condition<'t, T: Transaction + 't>(
        &self,
        tx: &'t T,
        node: &Expr,
        variable: &Variable,
    ) -> IndexResult<Box<dyn IndexIterator + 't>> {
        let terms = condition::search_terms(node, variable, self.descriptor.direction_attribute())
            .ok_or_else(|| {
                IndexError::IteratorConstruction(format!("edge index {} cannot serve condition {node}", self.id()))
            })?;
        let values = expand_in_search_values(&terms);
        if values.is_empty() {
            debug!(index = %self.id(), condition = %node, "no searchable values, using empty iterator");
            return Ok(Box::new(EmptyIndexIterator));
        }
        Ok(Box::new(EdgeIndexIterator::new(tx, EDGE_INDEX_TABLE, self.id(), values)))
    }

    fn iterator_over<'t, T: Transaction + 't>(&self, tx: &'t T, terms: &[SearchTerm<'_>]) -> EdgeIndexIterator<'t, T> {
        EdgeIndexIterator::new(tx, EDGE_INDEX_TABLE, self.id(), expand_in_search_values(terms))
    }

    // ========== Helpers ==========

    fn direction_value(&self, document: &Document) -> IndexResult<DirectionValue> {
        let attribute = self.descriptor.direction_attribute();
        let value = document.get(attribute).ok_or_else(|| IndexError::NotIndexable {
            key: document.key().clone(),
            reason: format!("missing attribute {attribute}"),
        })?;
        DirectionValue::try_from(value).map_err(|err| IndexError::NotIndexable {
            key: document.key().clone(),
            reason: format!("attribute {attribute}: {err}"),
        })
    }

    fn entry_key(&self, document: &Document) -> IndexResult<Vec<u8>> {
        let value = self.direction_value(document)?;
        Ok(encode_edge_index_key(self.id(), &value, document.key()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::descriptor::Direction;
    use spindle_core::CollectionId;
    use spindle_storage::backends::RedbEngine;
    use spindle_storage::StorageEngine;

    fn index() -> EdgeIndex {
        EdgeIndex::new(IndexDescriptor::for_direction(IndexId::new(5), CollectionId::new(1), Direction::To))
    }

    #[test]
    fn is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EdgeIndex>();
    }

    #[test]
    fn properties() {
        let idx = index();
        assert_eq!(idx.type_name(), "edge");
        assert_eq!(idx.index_type(), IndexType::Edge);
        assert!(!idx.allow_expansion());
        assert!(!idx.can_be_dropped());
        assert!(!idx.is_sorted());
        assert!(idx.has_selectivity_estimate());
        assert!(!idx.has_batch_insert());
    }

    #[test]
    fn insert_writes_revision() {
        let engine = RedbEngine::in_memory().unwrap();
        let mut tx = engine.begin_write().unwrap();
        let idx = index();
        let doc = Document::new("e1").with_attribute("_to", "v/9");
        idx.insert(&mut tx, RevisionId::new(77), &doc, false).unwrap();

        let key = encode_edge_index_key(idx.id(), &"v/9".into(), &DocumentKey::new("e1"));
        assert_eq!(tx.get(EDGE_INDEX_TABLE, &key).unwrap(), Some(77u64.to_be_bytes().to_vec()));
    }

    #[test]
    fn unindexable_documents() {
        let engine = RedbEngine::in_memory().unwrap();
        let mut tx = engine.begin_write().unwrap();
        let idx = index();

        let missing = Document::new("e1").with_attribute("_from", "v/1");
        let err = idx.insert(&mut tx, RevisionId::new(1), &missing, false).unwrap_err();
        assert!(matches!(err, IndexError::NotIndexable { ref key, .. } if key.as_str() == "e1"));
        // rollback does not make an unindexable insert succeed
        assert!(idx.insert(&mut tx, RevisionId::new(1), &missing, true).is_err());

        let float = Document::new("e2").with_attribute("_to", 1.5);
        assert!(idx.remove(&mut tx, RevisionId::new(1), &float, false).is_err());
        idx.remove(&mut tx, RevisionId::new(1), &float, true).unwrap();
    }

    #[test]
    fn selectivity_cache() {
        let engine = RedbEngine::in_memory().unwrap();
        let idx = EdgeIndex::with_config(
            IndexDescriptor::for_direction(IndexId::new(5), CollectionId::new(1), Direction::To),
            EdgeIndexConfig::new().default_selectivity(0.5),
        );
        assert_eq!(idx.selectivity_estimate(None), 0.5);
        assert!(idx.selectivity().computed_at.is_none());

        let mut tx = engine.begin_write().unwrap();
        for (key, to) in [("e1", "a"), ("e2", "a"), ("e3", "b"), ("e4", "b")] {
            idx.insert(&mut tx, RevisionId::new(1), &Document::new(key).with_attribute("_to", to), false)
                .unwrap();
        }
        let estimate = idx.recompute_selectivity(&tx).unwrap();
        assert_eq!(estimate.estimate, 0.5);
        assert!(estimate.computed_at.is_some());
        assert_eq!(idx.selectivity_estimate(Some(&"a".into())), 0.5);

        idx.unload().unwrap();
        assert!(idx.selectivity().computed_at.is_none());
    }

    #[test]
    fn definition_and_figures() {
        let idx = index();
        let plain = idx.to_definition_json(false).unwrap();
        assert_eq!(plain, serde_json::json!({ "type": "edge", "id": "5", "fields": ["_to"] }));

        let detailed = idx.to_definition(true);
        assert_eq!(detailed.selectivity_estimate, Some(EdgeIndexConfig::DEFAULT_SELECTIVITY));
        assert_eq!(detailed.unique, Some(false));

        let figures = idx.to_figures_json().unwrap();
        assert_eq!(figures["memory"], serde_json::json!(idx.memory()));
        assert!(idx.memory() >= mem::size_of::<EdgeIndex>());
    }
}
