// crates/traversal-group-core/src/interfaces/mod.rs
// ============================================================================
// Module: Traversal Group Interfaces
// Description: Store traits and the shared error taxonomy.
// Purpose: Define the insert-or-find contract every backend implements.
// Dependencies: crate::core, serde, thiserror
// ============================================================================

//! ## Overview
//! The store is split into four cooperating interfaces, one per namespace:
//! canonical objects, group classification, histogram aggregation, and the
//! trial ledger. Every write is atomic for one logical record and either
//! returns the existing row's key or inserts exactly one row. Errors name the
//! table and key involved so callers can decide whether to abort a trial or
//! the whole run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::core::CanonicalRepr;
use crate::core::ConservationReport;
use crate::core::CycleDecomp;
use crate::core::GraphId;
use crate::core::GraphRecord;
use crate::core::GroupClassId;
use crate::core::GroupClassRecord;
use crate::core::HistogramBucket;
use crate::core::NewTrial;
use crate::core::PermGroupId;
use crate::core::PermGroupRecord;
use crate::core::PermutationId;
use crate::core::PermutationRecord;
use crate::core::StoreCounts;
use crate::core::TrialId;
use crate::core::TrialRecord;
use crate::core::TrialTime;

// ============================================================================
// SECTION: Tables
// ============================================================================

/// Logical tables of the traversal group store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    /// Canonical graphs.
    Graph,
    /// Canonical permutations.
    Permutation,
    /// Group equivalence classes.
    GroupClass,
    /// Concrete permutation groups.
    PermGroup,
    /// Group membership join rows.
    GroupElement,
    /// Cycle-decomposition histogram buckets.
    Histogram,
    /// Trial ledger.
    Trial,
}

impl Table {
    /// Returns the stable table name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Graph => "graph",
            Self::Permutation => "permutation",
            Self::GroupClass => "group_class",
            Self::PermGroup => "perm_group",
            Self::GroupElement => "group_element",
            Self::Histogram => "histogram",
            Self::Trial => "trial",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Traversal group store errors.
///
/// # Invariants
/// - Keyed variants always name the table and the rendered key.
/// - Only [`StoreError::Transient`] is safe to retry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A referenced row does not exist.
    #[error("{table} references missing {target} {key}")]
    ForeignKey {
        /// Table the write targeted.
        table: Table,
        /// Table the missing row belongs to.
        target: Table,
        /// Rendered key of the missing row.
        key: String,
    },
    /// A unique key collided with different existing data.
    #[error("duplicate {table} row: {key}")]
    Duplicate {
        /// Table the write targeted.
        table: Table,
        /// Rendered unique key.
        key: String,
    },
    /// The same key was submitted with different derived attributes.
    #[error("inconsistent {table} row {key}: {detail}")]
    Consistency {
        /// Table the write targeted.
        table: Table,
        /// Rendered key.
        key: String,
        /// Description of the conflicting attributes.
        detail: String,
    },
    /// A structural invariant of the store would be violated.
    #[error("invariant violated on {table} {key}: {detail}")]
    Invariant {
        /// Table the write targeted.
        table: Table,
        /// Rendered key.
        key: String,
        /// Description of the violated invariant.
        detail: String,
    },
    /// Storage contention; the whole logical operation may be retried.
    #[error("transient store error on {table}: {message}")]
    Transient {
        /// Table the operation targeted.
        table: Table,
        /// Backend error message.
        message: String,
    },
    /// Input failed validation before reaching storage.
    #[error("traversal store invalid input: {0}")]
    Invalid(String),
    /// Store I/O error.
    #[error("traversal store io error: {0}")]
    Io(String),
    /// Stored data failed integrity checks.
    #[error("traversal store corruption: {0}")]
    Corrupt(String),
    /// Stored schema version is incompatible.
    #[error("traversal store version mismatch: {0}")]
    VersionMismatch(String),
    /// Backend reported an unclassified error.
    #[error("traversal store error: {0}")]
    Store(String),
}

impl StoreError {
    /// Returns true when the error is safe to retry.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Returns a stable label for the error class.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ForeignKey { .. } => "foreign_key",
            Self::Duplicate { .. } => "duplicate",
            Self::Consistency { .. } => "consistency",
            Self::Invariant { .. } => "invariant",
            Self::Transient { .. } => "transient",
            Self::Invalid(_) => "invalid",
            Self::Io(_) => "io",
            Self::Corrupt(_) => "corrupt",
            Self::VersionMismatch(_) => "version_mismatch",
            Self::Store(_) => "store",
        }
    }
}

// ============================================================================
// SECTION: Canonical Object Store
// ============================================================================

/// Dedup tables for graphs and permutations.
pub trait CanonicalObjectStore {
    /// Interns a graph, returning its id whether it was inserted or found.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Consistency`] when the id exists with different
    /// attributes.
    fn intern_graph(&self, graph: &GraphRecord) -> Result<GraphId, StoreError>;

    /// Interns a permutation, returning its id whether it was inserted or found.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Consistency`] when the id exists with a different
    /// cycle decomposition.
    fn intern_permutation(
        &self,
        permutation: &PermutationRecord,
    ) -> Result<PermutationId, StoreError>;

    /// Looks up a graph by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn find_graph(&self, id: GraphId) -> Result<Option<GraphRecord>, StoreError>;

    /// Looks up a permutation by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn find_permutation(&self, id: PermutationId)
    -> Result<Option<PermutationRecord>, StoreError>;
}

// ============================================================================
// SECTION: Group Classification Index
// ============================================================================

/// Group classes, concrete groups, and group membership.
pub trait GroupClassIndex {
    /// Finds or creates the class with the given repr.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invariant`] when the repr exists with a different
    /// size.
    fn classify_or_get(&self, repr: &CanonicalRepr, size: i64)
    -> Result<GroupClassId, StoreError>;

    /// Finds or creates the concrete group with the given repr.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ForeignKey`] when the class does not exist and
    /// [`StoreError::Consistency`] when the repr exists under another class.
    fn register_group_or_get(
        &self,
        repr: &CanonicalRepr,
        class_id: GroupClassId,
    ) -> Result<PermGroupId, StoreError>;

    /// Records that a permutation is an element of a group. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ForeignKey`] when either side does not exist.
    fn attach_element(
        &self,
        group_id: PermGroupId,
        permutation_id: PermutationId,
    ) -> Result<(), StoreError>;

    /// Looks up a class by repr.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn find_group_class(&self, repr: &CanonicalRepr)
    -> Result<Option<GroupClassRecord>, StoreError>;

    /// Looks up a concrete group by repr.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn find_perm_group(&self, repr: &CanonicalRepr) -> Result<Option<PermGroupRecord>, StoreError>;

    /// Returns the elements of a group in ascending order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn group_elements(&self, group_id: PermGroupId) -> Result<Vec<PermutationId>, StoreError>;

    /// Returns the groups classified under a class in ascending id order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn groups_in_class(&self, class_id: GroupClassId) -> Result<Vec<PermGroupRecord>, StoreError>;
}

// ============================================================================
// SECTION: Histogram Aggregation Store
// ============================================================================

/// Per-class cycle-decomposition histograms.
pub trait HistogramStore {
    /// Counts one element of the class with the given cycle type.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ForeignKey`] when the class does not exist and
    /// [`StoreError::Invariant`] when the class histogram is already full.
    fn record_element_decomp(
        &self,
        class_id: GroupClassId,
        decomp: CycleDecomp,
    ) -> Result<(), StoreError>;

    /// Writes the complete histogram of a class in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ForeignKey`] when the class does not exist,
    /// [`StoreError::Duplicate`] when the class already has buckets, and
    /// [`StoreError::Invariant`] when the buckets do not sum to the class size.
    fn record_class_histogram(
        &self,
        class_id: GroupClassId,
        buckets: &[HistogramBucket],
    ) -> Result<(), StoreError>;

    /// Returns the class histogram ordered by decomp ascending.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn histogram_of(&self, class_id: GroupClassId) -> Result<Vec<HistogramBucket>, StoreError>;

    /// Compares the bucket total of a class against its size.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ForeignKey`] when the class does not exist.
    fn check_conservation(&self, class_id: GroupClassId)
    -> Result<ConservationReport, StoreError>;
}

// ============================================================================
// SECTION: Trial Ledger
// ============================================================================

/// Append-only record of experiment trials.
pub trait TrialLedger {
    /// Appends a trial.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ForeignKey`] when the graph or group does not
    /// exist and [`StoreError::Duplicate`] when the unique tuple exists.
    fn record_trial(&self, trial: &NewTrial) -> Result<TrialId, StoreError>;

    /// Looks up a trial by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn find_trial(&self, id: TrialId) -> Result<Option<TrialRecord>, StoreError>;

    /// Returns trials with `start <= datetime < end`, ordered by time then id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn trials_between(
        &self,
        start: TrialTime,
        end: TrialTime,
    ) -> Result<Vec<TrialRecord>, StoreError>;

    /// Returns every trial run against a graph, ordered by time then id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn trials_for_graph(&self, graph_id: GraphId) -> Result<Vec<TrialRecord>, StoreError>;
}

// ============================================================================
// SECTION: Traversal Store
// ============================================================================

/// The full traversal group store.
pub trait TraversalStore:
    CanonicalObjectStore + GroupClassIndex + HistogramStore + TrialLedger
{
    /// Verifies the store can serve reads and writes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend is unavailable.
    fn readiness(&self) -> Result<(), StoreError>;

    /// Returns row counts per table.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the counts cannot be read.
    fn counts(&self) -> Result<StoreCounts, StoreError>;
}
