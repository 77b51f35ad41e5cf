// crates/traversal-group-core/tests/proptest_store.rs
// ============================================================================
// Module: Traversal Store Property-Based Tests
// Description: Property tests for histogram conservation and trial queries.
// Purpose: Check store invariants across wide input ranges.
// ============================================================================

//! Property-based tests for traversal store invariants.

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

use std::collections::BTreeSet;

use proptest::prelude::*;
use traversal_group_core::CanonicalObjectStore;
use traversal_group_core::CanonicalRepr;
use traversal_group_core::CycleDecomp;
use traversal_group_core::GraphId;
use traversal_group_core::GraphRecord;
use traversal_group_core::GroupClassIndex;
use traversal_group_core::GroupDiscovery;
use traversal_group_core::HistogramStore;
use traversal_group_core::InMemoryTraversalStore;
use traversal_group_core::MethodTag;
use traversal_group_core::NewTrial;
use traversal_group_core::NodeSubset;
use traversal_group_core::PermutationId;
use traversal_group_core::PermutationRecord;
use traversal_group_core::TraversalStore;
use traversal_group_core::TrialLedger;
use traversal_group_core::TrialTime;
use traversal_group_core::ingest_discovery;

fn discovery(decomps: &[i64]) -> GroupDiscovery {
    let elements: Vec<_> = decomps
        .iter()
        .enumerate()
        .map(|(index, decomp)| PermutationRecord {
            id: PermutationId::new(i64::try_from(index).unwrap()),
            cycle_decomp: CycleDecomp::new(*decomp),
        })
        .collect();
    let ids: Vec<_> = elements.iter().map(|element| element.id.get()).collect();
    GroupDiscovery {
        graph: GraphRecord {
            id: GraphId::new(1),
            nodes: 4,
            edges: 4,
        },
        nodes: NodeSubset::new(1),
        method: MethodTag::new("dfs"),
        group_repr: CanonicalRepr::from_value(&ids).unwrap(),
        class_repr: CanonicalRepr::from_value(&decomps).unwrap(),
        elements,
        datetime: TrialTime::from_unix_seconds(0.0),
    }
}

proptest! {
    #[test]
    fn ingested_class_histogram_is_conserved(
        decomps in prop::collection::vec(1_i64 .. 16, 1 .. 40),
    ) {
        let store = InMemoryTraversalStore::new();
        let outcome = ingest_discovery(&store, &discovery(&decomps)).unwrap();
        let report = store.check_conservation(outcome.class_id).unwrap();
        prop_assert!(report.is_complete());
        prop_assert_eq!(report.size, i64::try_from(decomps.len()).unwrap());
        let buckets = store.histogram_of(outcome.class_id).unwrap();
        prop_assert!(buckets.windows(2).all(|pair| pair[0].decomp < pair[1].decomp));
        let distinct: BTreeSet<_> = decomps.iter().collect();
        prop_assert_eq!(buckets.len(), distinct.len());
    }

    #[test]
    fn element_increments_never_exceed_size(size in 1_i64 .. 12, extra in 0_usize .. 6) {
        let store = InMemoryTraversalStore::new();
        let class_id = store.classify_or_get(&CanonicalRepr::new("[]"), size).unwrap();
        let attempts = usize::try_from(size).unwrap() + extra;
        let accepted = (0 .. attempts)
            .filter(|index| {
                let decomp = CycleDecomp::new(i64::try_from(index % 3).unwrap() + 1);
                store.record_element_decomp(class_id, decomp).is_ok()
            })
            .count();
        prop_assert_eq!(accepted, usize::try_from(size).unwrap());
        prop_assert!(store.check_conservation(class_id).unwrap().is_complete());
    }

    #[test]
    fn trials_between_returns_sorted_window(
        times in prop::collection::btree_set(0_i32 .. 1000, 1 .. 30),
        start in 0_i32 .. 1000,
        width in 0_i32 .. 500,
    ) {
        let store = InMemoryTraversalStore::new();
        store.intern_graph(&GraphRecord { id: GraphId::new(1), nodes: 1, edges: 0 }).unwrap();
        let class_id = store.classify_or_get(&CanonicalRepr::new("[1]"), 1).unwrap();
        let group_id = store.register_group_or_get(&CanonicalRepr::new("[0]"), class_id).unwrap();
        for time in times.iter().rev() {
            store.record_trial(&NewTrial {
                graph_id: GraphId::new(1),
                nodes: NodeSubset::new(1),
                method: MethodTag::new("bfs"),
                group_id,
                datetime: TrialTime::from_unix_seconds(f64::from(*time)),
            }).unwrap();
        }
        let end = start + width;
        let window = store
            .trials_between(
                TrialTime::from_unix_seconds(f64::from(start)),
                TrialTime::from_unix_seconds(f64::from(end)),
            )
            .unwrap();
        let expected: Vec<f64> =
            times.range(start .. end).map(|time| f64::from(*time)).collect();
        let actual: Vec<f64> =
            window.iter().map(|trial| trial.datetime.as_unix_seconds()).collect();
        prop_assert_eq!(actual, expected);
        prop_assert_eq!(store.counts().unwrap().trials, times.len() as u64);
    }
}
