//! End-to-end edge index tests against the in-memory Redb engine.

use std::collections::BTreeSet;

use spindle_core::encoding::Encoder;
use spindle_core::{CollectionId, Document, DocumentToken, IndexId, RevisionId};
use spindle_index::{
    Direction, EdgeIndex, EdgeIndexIterator, IndexDescriptor, IndexError, IndexIterator, SearchOrigin,
    SearchValue, SearchValues, TaskQueue, EDGE_INDEX_TABLE,
};
use spindle_query::{Expr, Literal, Variable};
use spindle_storage::backends::RedbEngine;
use spindle_storage::{StorageEngine, Transaction};

fn from_index() -> EdgeIndex {
    EdgeIndex::new(IndexDescriptor::for_direction(IndexId::new(10), CollectionId::new(1), Direction::From))
}

fn to_index() -> EdgeIndex {
    EdgeIndex::new(IndexDescriptor::for_direction(IndexId::new(11), CollectionId::new(1), Direction::To))
}

fn edge(key: &str, from: &str, to: &str) -> Document {
    Document::new(key).with_attribute("_from", from).with_attribute("_to", to)
}

/// e1: v1 -> v2, e2: v1 -> v3, e3: v2 -> v3
fn scenario() -> Vec<(RevisionId, Document)> {
    vec![
        (RevisionId::new(1), edge("e1", "v1", "v2")),
        (RevisionId::new(2), edge("e2", "v1", "v3")),
        (RevisionId::new(3), edge("e3", "v2", "v3")),
    ]
}

fn load<T: Transaction>(tx: &mut T, index: &EdgeIndex, docs: &[(RevisionId, Document)]) {
    for (rev, doc) in docs {
        index.insert(tx, *rev, doc, false).expect("insert");
    }
}

fn keys(tokens: &[DocumentToken]) -> Vec<String> {
    tokens.iter().map(|t| t.key.to_string()).collect()
}

fn e() -> Variable {
    Variable::new(0, "e")
}

fn from_attr() -> Expr {
    Expr::attribute(&e(), "_from")
}

#[test]
fn concrete_from_scenario() {
    let engine = RedbEngine::in_memory().expect("engine");
    let index = from_index();
    let mut tx = engine.begin_write().expect("begin write");
    load(&mut tx, &index, &scenario());
    tx.commit().expect("commit");

    let tx = engine.begin_read().expect("begin read");

    let mut it = index.create_eq_iterator(&tx, &Expr::string("v1"));
    let tokens = it.collect_remaining().expect("scan");
    assert_eq!(keys(&tokens), vec!["e1", "e2"]);
    assert_eq!(tokens[0].revision, RevisionId::new(1));
    assert_eq!(tokens[1].revision, RevisionId::new(2));

    let mut it = index.create_in_iterator(&tx, &[Expr::string("v1"), Expr::string("v2")]);
    let found: BTreeSet<String> = keys(&it.collect_remaining().expect("scan")).into_iter().collect();
    assert_eq!(found, ["e1", "e2", "e3"].into_iter().map(String::from).collect());

    let estimate = index.recompute_selectivity(&tx).expect("recompute");
    assert!((estimate.estimate - 2.0 / 3.0).abs() < 1e-9);
}

#[test]
fn to_direction_is_independent() {
    let engine = RedbEngine::in_memory().expect("engine");
    let (from, to) = (from_index(), to_index());
    let mut tx = engine.begin_write().expect("begin write");
    load(&mut tx, &from, &scenario());
    load(&mut tx, &to, &scenario());

    let mut it = to.create_eq_iterator(&tx, &Expr::string("v3"));
    assert_eq!(keys(&it.collect_remaining().expect("scan")), vec!["e2", "e3"]);
    let mut it = from.create_eq_iterator(&tx, &Expr::string("v3"));
    assert!(it.collect_remaining().expect("scan").is_empty());
}

#[test]
fn chunked_scan_matches_full_drain() {
    let engine = RedbEngine::in_memory().expect("engine");
    let index = from_index();
    let mut tx = engine.begin_write().expect("begin write");
    let docs: Vec<_> = (0..12)
        .map(|i| (RevisionId::new(i), edge(&format!("e{i:02}"), &format!("v{}", i % 3), "x")))
        .collect();
    load(&mut tx, &index, &docs);

    let list = [Expr::string("v2"), Expr::string("v0"), Expr::string("v2")];
    let full = index.create_in_iterator(&tx, &list).collect_remaining().expect("scan");
    assert_eq!(full.len(), 12);

    for limit in [1, 2, 5] {
        let mut it = index.create_in_iterator(&tx, &list);
        let mut chunked = Vec::new();
        loop {
            let mut batch = Vec::new();
            let more = it
                .next(
                    &mut |token| {
                        batch.push(token);
                        true
                    },
                    limit,
                )
                .expect("next");
            assert!(batch.len() <= limit);
            chunked.extend(batch);
            if !more {
                break;
            }
        }
        assert_eq!(chunked, full, "limit {limit}");
    }
}

#[test]
fn reset_is_idempotent() {
    let engine = RedbEngine::in_memory().expect("engine");
    let index = from_index();
    let mut tx = engine.begin_write().expect("begin write");
    load(&mut tx, &index, &scenario());

    let mut it = index.create_in_iterator(&tx, &[Expr::string("v2"), Expr::string("v1")]);
    let mut first = Vec::new();
    it.next(&mut |t| { first.push(t); true }, 2).expect("next");
    it.reset();
    let after_one = it.collect_remaining().expect("scan");
    it.reset();
    it.reset();
    let after_two = it.collect_remaining().expect("scan");
    assert_eq!(after_one, after_two);
    assert_eq!(keys(&after_one), vec!["e3", "e1", "e2"]);
    assert_eq!(first, after_one[..2]);
}

#[test]
fn insert_then_remove_restores_store() {
    let engine = RedbEngine::in_memory().expect("engine");
    let index = from_index();
    let mut tx = engine.begin_write().expect("begin write");
    load(&mut tx, &index, &scenario());

    let before = tx.range(EDGE_INDEX_TABLE, std::ops::Bound::Unbounded, std::ops::Bound::Unbounded).map(drain).expect("range");

    let extra = edge("e9", "v1", "v7");
    index.insert(&mut tx, RevisionId::new(9), &extra, false).expect("insert");
    assert_eq!(index.create_eq_iterator(&tx, &Expr::string("v1")).collect_remaining().expect("scan").len(), 3);
    index.remove(&mut tx, RevisionId::new(9), &extra, false).expect("remove");

    let after = tx.range(EDGE_INDEX_TABLE, std::ops::Bound::Unbounded, std::ops::Bound::Unbounded).map(drain).expect("range");
    assert_eq!(before, after);

    // removing again, or removing a document never indexed, is fine
    index.remove(&mut tx, RevisionId::new(9), &extra, false).expect("remove absent");
    index.remove(&mut tx, RevisionId::new(1), &edge("nope", "v1", "v2"), false).expect("remove never inserted");
}

fn drain<C: spindle_storage::Cursor>(mut cursor: C) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut out = Vec::new();
    while let Some(kv) = cursor.next().expect("next") {
        out.push(kv);
    }
    out
}

#[test]
fn update_is_remove_then_insert() {
    let engine = RedbEngine::in_memory().expect("engine");
    let index = from_index();
    let mut tx = engine.begin_write().expect("begin write");
    let old = edge("e1", "v1", "v2");
    index.insert(&mut tx, RevisionId::new(1), &old, false).expect("insert");

    let new = edge("e1", "v5", "v2");
    index.remove(&mut tx, RevisionId::new(1), &old, false).expect("remove");
    index.insert(&mut tx, RevisionId::new(2), &new, false).expect("insert");

    assert!(index.create_eq_iterator(&tx, &Expr::string("v1")).collect_remaining().expect("scan").is_empty());
    let tokens = index.create_eq_iterator(&tx, &Expr::string("v5")).collect_remaining().expect("scan");
    assert_eq!(tokens, vec![DocumentToken::new(RevisionId::new(2), "e1")]);
}

#[test]
fn rollback_reinsert_is_harmless() {
    let engine = RedbEngine::in_memory().expect("engine");
    let index = from_index();
    let mut tx = engine.begin_write().expect("begin write");
    let doc = edge("e1", "v1", "v2");
    index.insert(&mut tx, RevisionId::new(1), &doc, false).expect("insert");
    index.insert(&mut tx, RevisionId::new(1), &doc, true).expect("replayed insert");

    let tokens = index.create_eq_iterator(&tx, &Expr::string("v1")).collect_remaining().expect("scan");
    assert_eq!(tokens.len(), 1);
}

#[test]
fn integer_endpoints() {
    let engine = RedbEngine::in_memory().expect("engine");
    let index = from_index();
    let mut tx = engine.begin_write().expect("begin write");
    let docs = [
        (RevisionId::new(1), Document::new("a").with_attribute("_from", 42i64)),
        (RevisionId::new(2), Document::new("b").with_attribute("_from", "42")),
        (RevisionId::new(3), Document::new("c").with_attribute("_from", -1i64)),
    ];
    load(&mut tx, &index, &docs);

    // integers and strings never collide
    let ints = index.create_eq_iterator(&tx, &Expr::integer(42)).collect_remaining().expect("scan");
    assert_eq!(keys(&ints), vec!["a"]);
    let strs = index.create_eq_iterator(&tx, &Expr::string("42")).collect_remaining().expect("scan");
    assert_eq!(keys(&strs), vec!["b"]);
}

#[test]
fn batch_insert_reports_unindexable() {
    struct CountingQueue(std::sync::atomic::AtomicUsize);

    impl TaskQueue for CountingQueue {
        fn dispatch(&self, task: Box<dyn FnOnce() + Send>) {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            task();
        }
    }

    let engine = RedbEngine::in_memory().expect("engine");
    let index = from_index();
    let mut tx = engine.begin_write().expect("begin write");

    let mut docs = scenario();
    docs.insert(1, (RevisionId::new(7), Document::new("bad").with_attribute("_to", "v1")));
    let queue = CountingQueue(std::sync::atomic::AtomicUsize::new(0));
    let report = index.batch_insert(&mut tx, &docs, Some(&queue)).expect("batch insert");

    assert_eq!(report.inserted, 3);
    assert!(!report.is_complete());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0.as_str(), "bad");
    assert!(matches!(report.failures[0].1, IndexError::NotIndexable { .. }));
    // inserts run on the calling thread
    assert_eq!(queue.0.load(std::sync::atomic::Ordering::SeqCst), 0);

    let tokens = index.create_eq_iterator(&tx, &Expr::string("v1")).collect_remaining().expect("scan");
    assert_eq!(keys(&tokens), vec!["e1", "e2"]);
}

#[test]
fn batch_insert_on_read_only_transaction_fails() {
    let engine = RedbEngine::in_memory().expect("engine");
    let index = from_index();
    let mut tx = engine.begin_read().expect("begin read");
    let err = index.batch_insert(&mut tx, &scenario(), None).expect_err("read-only");
    assert!(matches!(err, IndexError::Storage(_)));
}

#[test]
fn planner_flow() {
    let engine = RedbEngine::in_memory().expect("engine");
    let index = from_index();
    let mut tx = engine.begin_write().expect("begin write");
    load(&mut tx, &index, &scenario());
    index.recompute_selectivity(&tx).expect("recompute");

    // FILTER e.weight > 1 AND (e._from == "v1" OR "v2" == e._from)
    let cond = Expr::attribute(&e(), "weight")
        .gt(Expr::integer(1))
        .and(from_attr().eq(Expr::string("v1")).or(Expr::string("v2").eq(from_attr())));

    let costs = index.supports_filter_condition(&cond, &e(), 3).expect("servable");
    assert_eq!(costs.estimated_items, 3);

    let split = index.specialize_condition(cond, &e()).expect("specialized");
    assert_eq!(split.remainder, Some(Expr::attribute(&e(), "weight").gt(Expr::integer(1))));
    assert_eq!(
        split.index_condition,
        from_attr().in_list(vec![Expr::string("v1"), Expr::string("v2")], false)
    );

    let mut it = index.iterator_for_condition(&tx, &split.index_condition, &e()).expect("iterator");
    assert_eq!(it.type_name(), "edge-index-iterator");
    assert_eq!(keys(&it.collect_remaining().expect("scan")), vec!["e1", "e2", "e3"]);
}

#[test]
fn unsupported_conditions() {
    let engine = RedbEngine::in_memory().expect("engine");
    let index = from_index();
    let mut tx = engine.begin_write().expect("begin write");
    load(&mut tx, &index, &scenario());

    let rejected = [
        Expr::attribute(&e(), "_to").eq(Expr::string("v1")),
        from_attr().gt(Expr::string("v1")),
        from_attr().like(Expr::string("v%")),
        from_attr().in_list(vec![Expr::string("v1")], true),
        from_attr().eq(Expr::string("v1")).not(),
    ];
    for cond in &rejected {
        assert!(index.supports_filter_condition(cond, &e(), 3).is_none(), "{cond}");
        let err = index.iterator_for_condition(&tx, cond, &e()).err().expect("unservable");
        assert!(matches!(err, IndexError::IteratorConstruction(_)), "{cond}");
    }
}

#[test]
fn conjunction_requires_specialization() {
    let engine = RedbEngine::in_memory().expect("engine");
    let index = from_index();
    let mut tx = engine.begin_write().expect("begin write");
    load(&mut tx, &index, &scenario());

    let cond = from_attr().eq(Expr::string("v1")).and(Expr::attribute(&e(), "w").gt(Expr::integer(3)));
    assert!(index.supports_filter_condition(&cond, &e(), 3).is_some());

    // the whole AND is refused instead of silently scanning nothing
    let err = index.iterator_for_condition(&tx, &cond, &e()).err().expect("needs specialization");
    assert!(matches!(err, IndexError::IteratorConstruction(_)));

    let split = index.specialize_condition(cond, &e()).expect("specialized");
    let tokens = index
        .iterator_for_condition(&tx, &split.index_condition, &e())
        .expect("iterator")
        .collect_remaining()
        .expect("scan");
    assert_eq!(keys(&tokens), vec!["e1", "e2"]);
    assert!(split.remainder.is_some());
}

#[test]
fn in_list_duplicates_and_unsearchable_values() {
    let engine = RedbEngine::in_memory().expect("engine");
    let index = from_index();
    let mut tx = engine.begin_write().expect("begin write");
    load(&mut tx, &index, &scenario());

    let list = vec![
        Expr::string("v2"),
        Expr::null(),
        Expr::string(""),
        Expr::float(1.0),
        Expr::string("v2"),
    ];
    let tokens = index.create_in_iterator(&tx, &list).collect_remaining().expect("scan");
    assert_eq!(keys(&tokens), vec!["e3", "e3"]);

    // an impossible equality yields nothing rather than failing
    let cond = from_attr().eq(Expr::boolean(true));
    let mut it = index.iterator_for_condition(&tx, &cond, &e()).expect("iterator");
    assert_eq!(it.type_name(), "empty-index-iterator");
    assert!(it.collect_remaining().expect("scan").is_empty());
}

#[test]
fn array_in_list_element_matches_nothing() {
    let engine = RedbEngine::in_memory().expect("engine");
    let index = from_index();
    let mut tx = engine.begin_write().expect("begin write");
    load(&mut tx, &index, &scenario());

    // e._from IN [["v1", "v2"]]: no endpoint equals an array
    let nested = Literal::Array(vec![Literal::String("v1".into()), Literal::String("v2".into())]);
    let cond = from_attr().in_list(vec![Expr::Literal(nested.clone())], false);

    let costs = index.supports_filter_condition(&cond, &e(), 3).expect("servable");
    assert_eq!(costs.estimated_items, 0);

    let split = index.specialize_condition(cond, &e()).expect("specialized");
    assert!(split.remainder.is_none());
    let tokens = index
        .iterator_for_condition(&tx, &split.index_condition, &e())
        .expect("iterator")
        .collect_remaining()
        .expect("scan");
    assert!(tokens.is_empty());

    // a bound array parameter inside IN behaves the same
    let list = vec![Expr::param("ids", nested)];
    assert!(index.create_in_iterator(&tx, &list).collect_remaining().expect("scan").is_empty());
}

#[test]
fn iterator_from_buffer() {
    let engine = RedbEngine::in_memory().expect("engine");
    let index = from_index();
    let mut tx = engine.begin_write().expect("begin write");
    load(&mut tx, &index, &scenario());

    let values: SearchValues = vec![SearchValue::new("v2", SearchOrigin::Equality)].into();
    let buf = values.encode().expect("encode");
    let mut it = EdgeIndexIterator::from_buffer(&tx, EDGE_INDEX_TABLE, index.id(), &buf).expect("build");
    assert_eq!(keys(&it.collect_remaining().expect("scan")), vec!["e3"]);

    let err = EdgeIndexIterator::from_buffer(&tx, EDGE_INDEX_TABLE, index.id(), &[0xFF]).err().expect("malformed");
    assert!(matches!(err, IndexError::IteratorConstruction(_)));
}

#[test]
fn scans_see_uncommitted_writes_of_same_transaction_only() {
    let engine = RedbEngine::in_memory().expect("engine");
    let index = from_index();

    let mut tx = engine.begin_write().expect("begin write");
    load(&mut tx, &index, &scenario());
    assert_eq!(index.create_eq_iterator(&tx, &Expr::string("v1")).collect_remaining().expect("scan").len(), 2);
    tx.rollback().expect("rollback");

    let tx = engine.begin_read().expect("begin read");
    assert!(index.create_eq_iterator(&tx, &Expr::string("v1")).collect_remaining().expect("scan").is_empty());
}
