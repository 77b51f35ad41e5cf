// crates/traversal-group-core/src/core/validation.rs
// ============================================================================
// Module: Traversal Group Validation
// Description: Input checks and conflict checks shared by store backends.
// Purpose: Make every backend reject the same inputs with the same errors.
// Dependencies: crate::{core, interfaces}, serde_json
// ============================================================================

//! ## Overview
//! Two kinds of checks live here. Input validation runs before any storage
//! access and fails with [`StoreError::Invalid`]. Conflict checks compare an
//! incoming submission against the row already stored under the same key and
//! fail with [`StoreError::Consistency`] or [`StoreError::Invariant`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::de::IgnoredAny;

use crate::core::CanonicalRepr;
use crate::core::CycleDecomp;
use crate::core::GraphRecord;
use crate::core::GroupClassId;
use crate::core::GroupClassRecord;
use crate::core::HistogramBucket;
use crate::core::MAX_REPR_BYTES;
use crate::core::NewTrial;
use crate::core::PermGroupRecord;
use crate::core::PermutationRecord;
use crate::core::TrialTime;
use crate::interfaces::StoreError;
use crate::interfaces::Table;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum method tag length in bytes.
pub const MAX_METHOD_TAG_LENGTH: usize = 32;
/// Number of repr characters kept when rendering a repr as an error key.
const REPR_KEY_PREVIEW_CHARS: usize = 64;

// ============================================================================
// SECTION: Key Rendering
// ============================================================================

/// Renders a repr for use as an error key, truncating long reprs.
#[must_use]
pub fn repr_key(repr: &CanonicalRepr) -> String {
    let text = repr.as_str();
    match text.char_indices().nth(REPR_KEY_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[.. cut]),
        None => text.to_string(),
    }
}

/// Renders a `(group, element)` pair key.
#[must_use]
pub fn element_key(group: impl std::fmt::Display, element: impl std::fmt::Display) -> String {
    format!("({group}, {element})")
}

/// Renders the unique tuple of a trial.
#[must_use]
pub fn trial_key(trial: &NewTrial) -> String {
    format!(
        "(graph={}, nodes={}, method={}, datetime={})",
        trial.graph_id, trial.nodes, trial.method, trial.datetime
    )
}

// ============================================================================
// SECTION: Input Validation
// ============================================================================

/// Validates a graph submission.
///
/// # Errors
///
/// Returns [`StoreError::Invalid`] for negative ids or counts.
pub fn validate_graph(graph: &GraphRecord) -> Result<(), StoreError> {
    if graph.id.get() < 0 {
        return Err(StoreError::Invalid(format!("graph id must be non-negative: {}", graph.id)));
    }
    if graph.nodes < 0 || graph.edges < 0 {
        return Err(StoreError::Invalid(format!(
            "graph {} has negative node or edge count",
            graph.id
        )));
    }
    Ok(())
}

/// Validates a permutation submission.
///
/// # Errors
///
/// Returns [`StoreError::Invalid`] for negative ids or non-positive decomps.
pub fn validate_permutation(permutation: &PermutationRecord) -> Result<(), StoreError> {
    if permutation.id.get() < 0 {
        return Err(StoreError::Invalid(format!(
            "permutation id must be non-negative: {}",
            permutation.id
        )));
    }
    validate_decomp(permutation.cycle_decomp)
}

/// Validates a cycle decomposition encoding.
///
/// # Errors
///
/// Returns [`StoreError::Invalid`] when the encoding is not positive.
pub fn validate_decomp(decomp: CycleDecomp) -> Result<(), StoreError> {
    if decomp.get() < 1 {
        return Err(StoreError::Invalid(format!("cycle decomposition must be positive: {decomp}")));
    }
    Ok(())
}

/// Validates a canonical repr.
///
/// # Errors
///
/// Returns [`StoreError::Invalid`] for empty, oversized, or malformed JSON.
pub fn validate_repr(table: Table, repr: &CanonicalRepr) -> Result<(), StoreError> {
    if repr.is_empty() {
        return Err(StoreError::Invalid(format!("{table} repr must not be empty")));
    }
    if repr.len() > MAX_REPR_BYTES {
        return Err(StoreError::Invalid(format!(
            "{table} repr exceeds size limit: {} bytes (max {MAX_REPR_BYTES})",
            repr.len()
        )));
    }
    serde_json::from_str::<IgnoredAny>(repr.as_str()).map_err(|err| {
        StoreError::Invalid(format!("{table} repr is not valid json: {err}"))
    })?;
    Ok(())
}

/// Validates a declared class size.
///
/// # Errors
///
/// Returns [`StoreError::Invalid`] when the size is not positive.
pub fn validate_class_size(size: i64) -> Result<(), StoreError> {
    if size < 1 {
        return Err(StoreError::Invalid(format!("group class size must be positive: {size}")));
    }
    Ok(())
}

/// Validates a trial submission.
///
/// # Errors
///
/// Returns [`StoreError::Invalid`] for malformed method tags or timestamps.
pub fn validate_trial(trial: &NewTrial) -> Result<(), StoreError> {
    let method = trial.method.as_str();
    if method.is_empty() || method.len() > MAX_METHOD_TAG_LENGTH {
        return Err(StoreError::Invalid(format!(
            "method tag must be 1..={MAX_METHOD_TAG_LENGTH} bytes: '{method}'"
        )));
    }
    if !method.bytes().all(|byte| byte.is_ascii_graphic()) {
        return Err(StoreError::Invalid(format!(
            "method tag must be printable ascii without spaces: '{method}'"
        )));
    }
    validate_time(trial.datetime)
}

/// Validates a trial timestamp.
///
/// # Errors
///
/// Returns [`StoreError::Invalid`] when the value is not finite.
pub fn validate_time(time: TrialTime) -> Result<(), StoreError> {
    if !time.is_finite() {
        return Err(StoreError::Invalid(format!("trial datetime must be finite: {time}")));
    }
    Ok(())
}

// ============================================================================
// SECTION: Conflict Checks
// ============================================================================

/// Ensures a resubmitted graph matches the stored row.
///
/// # Errors
///
/// Returns [`StoreError::Consistency`] when attributes differ.
pub fn ensure_graph_matches(
    stored: &GraphRecord,
    incoming: &GraphRecord,
) -> Result<(), StoreError> {
    if stored == incoming {
        return Ok(());
    }
    Err(StoreError::Consistency {
        table: Table::Graph,
        key: stored.id.to_string(),
        detail: format!(
            "stored nodes={} edges={}, submitted nodes={} edges={}",
            stored.nodes, stored.edges, incoming.nodes, incoming.edges
        ),
    })
}

/// Ensures a resubmitted permutation matches the stored row.
///
/// # Errors
///
/// Returns [`StoreError::Consistency`] when the cycle decompositions differ.
pub fn ensure_permutation_matches(
    stored: &PermutationRecord,
    incoming: &PermutationRecord,
) -> Result<(), StoreError> {
    if stored == incoming {
        return Ok(());
    }
    Err(StoreError::Consistency {
        table: Table::Permutation,
        key: stored.id.to_string(),
        detail: format!(
            "stored cycle_decomp={}, submitted cycle_decomp={}",
            stored.cycle_decomp, incoming.cycle_decomp
        ),
    })
}

/// Ensures a reclassified repr carries the stored size.
///
/// # Errors
///
/// Returns [`StoreError::Invariant`] when the sizes differ.
pub fn ensure_class_size_matches(stored: &GroupClassRecord, size: i64) -> Result<(), StoreError> {
    if stored.size == size {
        return Ok(());
    }
    Err(StoreError::Invariant {
        table: Table::GroupClass,
        key: repr_key(&stored.repr),
        detail: format!("stored size={}, submitted size={size}", stored.size),
    })
}

/// Ensures a re-registered group repr names the stored class.
///
/// # Errors
///
/// Returns [`StoreError::Consistency`] when the classes differ.
pub fn ensure_group_class_matches(
    stored: &PermGroupRecord,
    class_id: GroupClassId,
) -> Result<(), StoreError> {
    if stored.class_id == class_id {
        return Ok(());
    }
    Err(StoreError::Consistency {
        table: Table::PermGroup,
        key: repr_key(&stored.repr),
        detail: format!("stored cls={}, submitted cls={class_id}", stored.class_id),
    })
}

/// Ensures a class histogram still has room for another element.
///
/// # Errors
///
/// Returns [`StoreError::Invariant`] once the bucket total reaches the size.
pub fn ensure_histogram_open(
    class_id: GroupClassId,
    size: i64,
    total: i64,
) -> Result<(), StoreError> {
    if total < size {
        return Ok(());
    }
    Err(StoreError::Invariant {
        table: Table::Histogram,
        key: class_id.to_string(),
        detail: format!("histogram closed: {total} of {size} elements already recorded"),
    })
}

/// Validates a complete class histogram against the class size.
///
/// # Errors
///
/// Returns [`StoreError::Invalid`] for malformed decomps and
/// [`StoreError::Invariant`] for repeated decomps, non-positive counts, or a
/// total that differs from `size`.
pub fn validate_class_histogram(
    class_id: GroupClassId,
    size: i64,
    buckets: &[HistogramBucket],
) -> Result<(), StoreError> {
    let invariant = |detail: String| StoreError::Invariant {
        table: Table::Histogram,
        key: class_id.to_string(),
        detail,
    };
    let mut seen = BTreeSet::new();
    let mut total: i64 = 0;
    for bucket in buckets {
        validate_decomp(bucket.decomp)?;
        if bucket.count < 1 {
            return Err(invariant(format!(
                "bucket {} has non-positive count {}",
                bucket.decomp, bucket.count
            )));
        }
        if !seen.insert(bucket.decomp) {
            return Err(invariant(format!("bucket {} appears more than once", bucket.decomp)));
        }
        total = total
            .checked_add(bucket.count)
            .ok_or_else(|| invariant("bucket counts overflow".to_string()))?;
    }
    if total != size {
        return Err(invariant(format!("bucket counts sum to {total}, class size is {size}")));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic, reason = "Test-only assertions are permitted.")]

    use super::*;
    use crate::core::GraphId;
    use crate::core::MethodTag;
    use crate::core::NodeSubset;
    use crate::core::PermGroupId;

    #[test]
    fn repr_key_truncates_long_reprs() {
        let repr = CanonicalRepr::new(format!("[{}]", "1,".repeat(100)));
        let key = repr_key(&repr);
        assert!(key.ends_with("..."));
        assert_eq!(key.chars().count(), REPR_KEY_PREVIEW_CHARS + 3);
    }

    #[test]
    fn validate_repr_rejects_malformed_json() {
        let err = validate_repr(Table::GroupClass, &CanonicalRepr::new("[[1,2]")).unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
        validate_repr(Table::GroupClass, &CanonicalRepr::new("[[1,2],[3]]")).unwrap();
    }

    #[test]
    fn validate_trial_rejects_bad_method_tags() {
        let mut trial = NewTrial {
            graph_id: GraphId::new(42),
            nodes: NodeSubset::new(15),
            method: MethodTag::new("BFS1"),
            group_id: PermGroupId::new(7),
            datetime: TrialTime::from_unix_seconds(1000.0),
        };
        validate_trial(&trial).unwrap();
        trial.method = MethodTag::new("breadth first");
        assert!(validate_trial(&trial).is_err());
        trial.method = MethodTag::new("");
        assert!(validate_trial(&trial).is_err());
        trial.method = MethodTag::new("bfs");
        trial.datetime = TrialTime::from_unix_seconds(f64::NAN);
        assert!(validate_trial(&trial).is_err());
    }

    #[test]
    fn class_histogram_must_sum_to_size() {
        let class_id = GroupClassId::new(1);
        let buckets = [
            HistogramBucket {
                decomp: CycleDecomp::new(8),
                count: 1,
            },
            HistogramBucket {
                decomp: CycleDecomp::new(3),
                count: 2,
            },
        ];
        validate_class_histogram(class_id, 3, &buckets).unwrap();
        let Err(StoreError::Invariant { table, .. }) =
            validate_class_histogram(class_id, 4, &buckets)
        else {
            panic!("expected invariant error");
        };
        assert_eq!(table, Table::Histogram);
    }

    #[test]
    fn class_histogram_rejects_repeated_decomps() {
        let bucket = HistogramBucket {
            decomp: CycleDecomp::new(8),
            count: 1,
        };
        assert!(validate_class_histogram(GroupClassId::new(1), 2, &[bucket, bucket]).is_err());
    }
}
