// crates/traversal-group-store-sqlite/tests/sqlite_runtime.rs
// ============================================================================
// Module: SQLite Runtime Tests
// Description: Ingestion, caching, retry, and audit over the SQLite store.
// Purpose: Ensure the runtime helpers behave identically on durable storage.
// Dependencies: traversal-group-store-sqlite, traversal-group-core, rusqlite, serde_json, tempfile
// ============================================================================

//! ## Overview
//! Drives [`ingest_discovery`] against SQLite and checks the lookup cache,
//! lock contention handling, and per-attempt audit events.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use serde_json::Value;
use tempfile::TempDir;
use traversal_group_core::AuditOutcome;
use traversal_group_core::CanonicalObjectStore;
use traversal_group_core::CanonicalRepr;
use traversal_group_core::CycleDecomp;
use traversal_group_core::FileAuditSink;
use traversal_group_core::GraphId;
use traversal_group_core::GraphRecord;
use traversal_group_core::GroupClassIndex;
use traversal_group_core::GroupDiscovery;
use traversal_group_core::HistogramStore;
use traversal_group_core::MethodTag;
use traversal_group_core::NodeSubset;
use traversal_group_core::PermutationId;
use traversal_group_core::PermutationRecord;
use traversal_group_core::RetryPolicy;
use traversal_group_core::StoreAuditEvent;
use traversal_group_core::StoreAuditSink;
use traversal_group_core::StoreError;
use traversal_group_core::StoreOperation;
use traversal_group_core::Table;
use traversal_group_core::TraversalStore;
use traversal_group_core::TrialLedger;
use traversal_group_core::TrialTime;
use traversal_group_core::ingest_discovery;
use traversal_group_store_sqlite::SqliteStoreConfig;
use traversal_group_store_sqlite::SqliteTraversalStore;

// ============================================================================
// SECTION: Helpers
// ============================================================================

#[derive(Default)]
struct CollectingSink {
    events: Mutex<Vec<StoreAuditEvent>>,
}

impl StoreAuditSink for CollectingSink {
    fn record(&self, event: &StoreAuditEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

fn store_for(path: &Path) -> SqliteTraversalStore {
    SqliteTraversalStore::new(SqliteStoreConfig {
        busy_timeout_ms: 1_000,
        ..SqliteStoreConfig::new(path)
    })
    .unwrap()
}

fn graph() -> GraphRecord {
    GraphRecord {
        id: GraphId::new(42),
        nodes: 5,
        edges: 6,
    }
}

/// Klein four-group: identity plus three double transpositions.
fn klein_discovery(group_repr: &str, datetime: f64) -> GroupDiscovery {
    let elements = [(0, 1), (21, 4), (26, 4), (31, 4)]
        .into_iter()
        .map(|(id, decomp)| PermutationRecord {
            id: PermutationId::new(id),
            cycle_decomp: CycleDecomp::new(decomp),
        })
        .collect();
    GroupDiscovery {
        graph: graph(),
        nodes: NodeSubset::new(7),
        method: MethodTag::new("dfs"),
        group_repr: CanonicalRepr::new(group_repr),
        class_repr: CanonicalRepr::new("[[[1,1,1,1],1],[[2,2],3]]"),
        elements,
        datetime: TrialTime::from_unix_seconds(datetime),
    }
}

// ============================================================================
// SECTION: Ingestion
// ============================================================================

#[test]
fn sqlite_ingest_builds_complete_histogram() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("store.sqlite"));
    let outcome = ingest_discovery(&store, &klein_discovery("[0,21,26,31]", 1.0)).unwrap();
    assert!(outcome.new_group);
    assert!(outcome.new_class);
    let report = store.check_conservation(outcome.class_id).unwrap();
    assert_eq!(report.size, 4);
    assert!(report.is_complete());
    assert_eq!(store.histogram_of(outcome.class_id).unwrap().len(), 2);
    assert_eq!(store.group_elements(outcome.group_id).unwrap().len(), 4);
}

#[test]
fn sqlite_ingest_survives_restart() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("store.sqlite");
    let first = {
        let store = store_for(&path);
        ingest_discovery(&store, &klein_discovery("[0,21,26,31]", 1.0)).unwrap()
    };
    let store = store_for(&path);
    let second = ingest_discovery(&store, &klein_discovery("[0,21,26,31]", 2.0)).unwrap();
    assert!(!second.new_group);
    assert!(!second.new_class);
    assert_eq!(second.group_id, first.group_id);
    let counts = store.counts().unwrap();
    assert_eq!(counts.trials, 2);
    assert_eq!(counts.histogram_buckets, 2);
    assert_eq!(store.trials_for_graph(GraphId::new(42)).unwrap().len(), 2);
}

#[test]
fn sqlite_ingest_resumes_after_partial_class() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("store.sqlite"));
    let discovery = klein_discovery("[0,21,26,31]", 1.0);
    store.intern_graph(&discovery.graph).unwrap();
    let class_id = store.classify_or_get(&discovery.class_repr, 4).unwrap();
    let outcome = ingest_discovery(&store, &discovery).unwrap();
    assert_eq!(outcome.class_id, class_id);
    assert!(!outcome.new_class);
    assert!(store.check_conservation(class_id).unwrap().is_complete());
}

// ============================================================================
// SECTION: Cache
// ============================================================================

#[test]
fn sqlite_cache_serves_repeated_lookups() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("store.sqlite"));
    store.intern_graph(&graph()).unwrap();
    let before = store.cache_stats();
    store.intern_graph(&graph()).unwrap();
    assert_eq!(store.find_graph(GraphId::new(42)).unwrap(), Some(graph()));
    let after = store.cache_stats();
    assert!(after.hits >= before.hits + 2);
    assert!(after.entries >= 1);
}

#[test]
fn sqlite_cache_hit_still_detects_conflict() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("store.sqlite"));
    store.intern_graph(&graph()).unwrap();
    let conflicting = GraphRecord {
        edges: 7,
        ..graph()
    };
    assert!(matches!(
        store.intern_graph(&conflicting),
        Err(StoreError::Consistency { table: Table::Graph, .. })
    ));
}

// ============================================================================
// SECTION: Contention
// ============================================================================

#[test]
fn sqlite_locked_writer_reports_transient_after_retries() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("store.sqlite");
    let sink = Arc::new(CollectingSink::default());
    let store = SqliteTraversalStore::new(SqliteStoreConfig {
        busy_timeout_ms: 10,
        ..SqliteStoreConfig::new(&path)
    })
    .unwrap()
    .with_retry_policy(RetryPolicy {
        max_attempts: 2,
        backoff_ms: 0,
    })
    .with_audit_sink(sink.clone());

    let blocker = rusqlite::Connection::open(&path).unwrap();
    blocker.execute_batch("BEGIN IMMEDIATE;").unwrap();
    let Err(StoreError::Transient {
        table, ..
    }) = store.intern_graph(&graph())
    else {
        panic!("expected transient error while the writer lock is held");
    };
    assert_eq!(table, Table::Graph);
    blocker.execute_batch("COMMIT;").unwrap();

    assert_eq!(store.intern_graph(&graph()).unwrap(), GraphId::new(42));
    let events = sink.events.lock().unwrap();
    let outcomes: Vec<_> = events.iter().map(|event| (event.outcome, event.attempt)).collect();
    assert_eq!(
        outcomes,
        vec![
            (AuditOutcome::Retried, 1),
            (AuditOutcome::Rejected, 2),
            (AuditOutcome::Created, 1),
        ]
    );
    assert_eq!(events[1].error_kind, Some("transient"));
}

// ============================================================================
// SECTION: Audit
// ============================================================================

#[test]
fn sqlite_writes_are_audited_to_file() {
    let temp = TempDir::new().unwrap();
    let log_path = temp.path().join("audit.jsonl");
    let sink = Arc::new(FileAuditSink::new(&log_path).unwrap());
    let store = store_for(&temp.path().join("store.sqlite")).with_audit_sink(sink);
    ingest_discovery(&store, &klein_discovery("[0,21,26,31]", 1.0)).unwrap();
    drop(store);

    let contents = std::fs::read_to_string(&log_path).unwrap();
    let events: Vec<Value> =
        contents.lines().map(|line| serde_json::from_str(line).unwrap()).collect();
    assert!(events.iter().all(|event| event["event"] == "store_write"));
    let operations: Vec<&str> =
        events.iter().filter_map(|event| event["operation"].as_str()).collect();
    assert_eq!(operations.first(), Some(&StoreOperation::InternGraph.as_str()));
    assert_eq!(operations.last(), Some(&StoreOperation::RecordTrial.as_str()));
    assert!(operations.contains(&StoreOperation::RecordClassHistogram.as_str()));
    assert_eq!(
        operations.iter().filter(|op| **op == StoreOperation::AttachElement.as_str()).count(),
        4
    );
}
