//! File-backed Redb engine tests.

use std::ops::Bound;

use spindle_storage::backends::{RedbConfig, RedbEngine};
use spindle_storage::{Cursor, StorageEngine, Transaction};

#[test]
fn data_survives_reopen() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("edges.redb");

    {
        let engine = RedbEngine::open(&path).expect("failed to open");
        let mut tx = engine.begin_write().expect("failed to begin write");
        tx.put("idx", b"k1", b"r1").expect("failed to put");
        tx.put("idx", b"k2", b"r2").expect("failed to put");
        tx.commit().expect("failed to commit");
        engine.flush().expect("failed to flush");
    }

    let engine = RedbEngine::open_with_config(&path, RedbConfig::new().cache_size(1 << 20))
        .expect("failed to reopen");
    let tx = engine.begin_read().expect("failed to begin read");
    assert_eq!(tx.get("idx", b"k1").expect("get"), Some(b"r1".to_vec()));
    assert_eq!(tx.get("idx", b"k2").expect("get"), Some(b"r2".to_vec()));
}

#[test]
fn read_snapshot_ignores_later_writes() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let engine = RedbEngine::open(dir.path().join("snap.redb")).expect("failed to open");

    {
        let mut tx = engine.begin_write().expect("failed to begin write");
        tx.put("idx", b"a", b"1").expect("failed to put");
        tx.commit().expect("failed to commit");
    }

    let snapshot = engine.begin_read().expect("failed to begin read");
    {
        let mut tx = engine.begin_write().expect("failed to begin write");
        tx.put("idx", b"b", b"2").expect("failed to put");
        tx.commit().expect("failed to commit");
    }

    let mut cursor = snapshot.range("idx", Bound::Unbounded, Bound::Unbounded).expect("range");
    assert_eq!(cursor.next().expect("next").map(|(k, _)| k), Some(b"a".to_vec()));
    assert_eq!(cursor.next().expect("next"), None);
}

#[test]
fn large_scan_streams_in_batches() {
    let engine = RedbEngine::in_memory_with_config(RedbConfig::new().cursor_batch_size(7))
        .expect("failed to create engine");
    let mut tx = engine.begin_write().expect("failed to begin write");
    for i in 0u32..100 {
        tx.put("idx", &i.to_be_bytes(), b"").expect("failed to put");
    }
    tx.commit().expect("failed to commit");

    let tx = engine.begin_read().expect("failed to begin read");
    let mut cursor = tx
        .range("idx", Bound::Included(20u32.to_be_bytes().as_slice()), Bound::Excluded(80u32.to_be_bytes().as_slice()))
        .expect("range");
    let mut seen = Vec::new();
    while let Some((k, _)) = cursor.next().expect("next") {
        seen.push(u32::from_be_bytes(k.try_into().expect("4-byte key")));
    }
    assert_eq!(seen, (20..80).collect::<Vec<_>>());
}
