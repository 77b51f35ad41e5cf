// crates/traversal-group-core/src/core/records.rs
// ============================================================================
// Module: Traversal Group Records
// Description: Row shapes for every table in the traversal group store.
// Purpose: Provide backend-neutral records exchanged through store interfaces.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Records mirror the persisted rows one-to-one. Graph and permutation records
//! carry the derived attributes submitted alongside their canonical encoding;
//! class and group records carry the surrogate id allocated by the store.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::canonical::CanonicalRepr;
use crate::core::identifiers::CycleDecomp;
use crate::core::identifiers::GraphId;
use crate::core::identifiers::GroupClassId;
use crate::core::identifiers::MethodTag;
use crate::core::identifiers::NodeSubset;
use crate::core::identifiers::PermGroupId;
use crate::core::identifiers::PermutationId;
use crate::core::identifiers::TrialId;
use crate::core::time::TrialTime;

// ============================================================================
// SECTION: Canonical Objects
// ============================================================================

/// A graph keyed by its canonical encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphRecord {
    /// Canonical graph encoding.
    pub id: GraphId,
    /// Node count.
    pub nodes: i64,
    /// Edge count.
    pub edges: i64,
}

/// A permutation keyed by its canonical encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermutationRecord {
    /// Canonical permutation encoding.
    pub id: PermutationId,
    /// Encoded cycle type of the permutation.
    pub cycle_decomp: CycleDecomp,
}

// ============================================================================
// SECTION: Group Classification
// ============================================================================

/// An equivalence class of permutation groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupClassRecord {
    /// Surrogate class id.
    pub id: GroupClassId,
    /// Canonical JSON signature of the class.
    pub repr: CanonicalRepr,
    /// Element count shared by every group in the class.
    pub size: i64,
}

/// A concrete permutation group classified under a group class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermGroupRecord {
    /// Surrogate group id.
    pub id: PermGroupId,
    /// Canonical JSON listing of the group.
    pub repr: CanonicalRepr,
    /// Class the group belongs to.
    pub class_id: GroupClassId,
}

// ============================================================================
// SECTION: Histograms
// ============================================================================

/// One `(decomp, count)` bucket of a class histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HistogramBucket {
    /// Encoded cycle type.
    pub decomp: CycleDecomp,
    /// Number of class elements with this cycle type.
    pub count: i64,
}

/// Result of checking histogram conservation for a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConservationReport {
    /// Class that was checked.
    pub class_id: GroupClassId,
    /// Declared class size.
    pub size: i64,
    /// Sum of bucket counts recorded for the class.
    pub total: i64,
}

impl ConservationReport {
    /// Returns true when the bucket counts sum to the class size.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.total == self.size
    }

    /// Returns how many more elements may still be attributed to the class.
    #[must_use]
    pub const fn remaining(&self) -> i64 {
        self.size.saturating_sub(self.total)
    }
}

// ============================================================================
// SECTION: Trials
// ============================================================================

/// Trial data submitted to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTrial {
    /// Graph the trial ran against.
    pub graph_id: GraphId,
    /// Encoded subset of starting nodes.
    pub nodes: NodeSubset,
    /// Traversal method tag.
    pub method: MethodTag,
    /// Group discovered by the trial.
    pub group_id: PermGroupId,
    /// Instant the trial ran.
    pub datetime: TrialTime,
}

/// A trial row as persisted in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    /// Surrogate trial id.
    pub id: TrialId,
    /// Graph the trial ran against.
    pub graph_id: GraphId,
    /// Encoded subset of starting nodes.
    pub nodes: NodeSubset,
    /// Traversal method tag.
    pub method: MethodTag,
    /// Group discovered by the trial.
    pub group_id: PermGroupId,
    /// Instant the trial ran.
    pub datetime: TrialTime,
}

impl TrialRecord {
    /// Builds the persisted row for a submitted trial.
    #[must_use]
    pub fn from_new(id: TrialId, trial: &NewTrial) -> Self {
        Self {
            id,
            graph_id: trial.graph_id,
            nodes: trial.nodes,
            method: trial.method.clone(),
            group_id: trial.group_id,
            datetime: trial.datetime,
        }
    }

    /// Returns true when the row has the same unique tuple as `trial`.
    #[must_use]
    pub fn same_key(&self, trial: &NewTrial) -> bool {
        self.graph_id == trial.graph_id
            && self.nodes == trial.nodes
            && self.method == trial.method
            && self.datetime == trial.datetime
    }
}

// ============================================================================
// SECTION: Diagnostics
// ============================================================================

/// Row counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreCounts {
    /// Graph rows.
    pub graphs: u64,
    /// Permutation rows.
    pub permutations: u64,
    /// Group class rows.
    pub group_classes: u64,
    /// Permutation group rows.
    pub perm_groups: u64,
    /// Group element rows.
    pub group_elements: u64,
    /// Histogram bucket rows.
    pub histogram_buckets: u64,
    /// Trial rows.
    pub trials: u64,
}
