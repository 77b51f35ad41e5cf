// crates/traversal-group-core/src/runtime/memory.rs
// ============================================================================
// Module: In-Memory Traversal Store
// Description: Mutex-guarded traversal store for tests and local runs.
// Purpose: Provide a deterministic store implementation without external deps.
// Dependencies: crate::{audit, core, interfaces}
// ============================================================================

//! ## Overview
//! [`InMemoryTraversalStore`] keeps every table in ordered maps behind one
//! mutex, so each operation is trivially atomic. It applies the same
//! validation and conflict checks as the durable backend and emits the same
//! audit events. It is not intended for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::audit::NoopAuditSink;
use crate::audit::StoreAuditSink;
use crate::audit::StoreOperation;
use crate::audit::record_write;
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
use crate::core::validation;
use crate::interfaces::CanonicalObjectStore;
use crate::interfaces::GroupClassIndex;
use crate::interfaces::HistogramStore;
use crate::interfaces::StoreError;
use crate::interfaces::Table;
use crate::interfaces::TraversalStore;
use crate::interfaces::TrialLedger;

// ============================================================================
// SECTION: State
// ============================================================================

/// Table contents of the in-memory store.
#[derive(Debug, Default)]
struct MemoryState {
    /// Graph rows by id.
    graphs: BTreeMap<GraphId, GraphRecord>,
    /// Permutation rows by id.
    permutations: BTreeMap<PermutationId, PermutationRecord>,
    /// Class rows by id.
    classes: BTreeMap<GroupClassId, GroupClassRecord>,
    /// Class ids by repr.
    class_ids: BTreeMap<CanonicalRepr, GroupClassId>,
    /// Group rows by id.
    groups: BTreeMap<PermGroupId, PermGroupRecord>,
    /// Group ids by repr.
    group_ids: BTreeMap<CanonicalRepr, PermGroupId>,
    /// Group membership pairs.
    elements: BTreeSet<(PermGroupId, PermutationId)>,
    /// Histogram counts by class and decomp.
    histogram: BTreeMap<(GroupClassId, CycleDecomp), i64>,
    /// Trial rows by id.
    trials: BTreeMap<TrialId, TrialRecord>,
    /// Last allocated class id.
    last_class_id: i64,
    /// Last allocated group id.
    last_group_id: i64,
    /// Last allocated trial id.
    last_trial_id: i64,
}

impl MemoryState {
    /// Inserts or finds a graph.
    fn intern_graph(&mut self, graph: &GraphRecord) -> Result<(GraphId, bool), StoreError> {
        if let Some(stored) = self.graphs.get(&graph.id) {
            validation::ensure_graph_matches(stored, graph)?;
            return Ok((graph.id, false));
        }
        self.graphs.insert(graph.id, *graph);
        Ok((graph.id, true))
    }

    /// Inserts or finds a permutation.
    fn intern_permutation(
        &mut self,
        permutation: &PermutationRecord,
    ) -> Result<(PermutationId, bool), StoreError> {
        if let Some(stored) = self.permutations.get(&permutation.id) {
            validation::ensure_permutation_matches(stored, permutation)?;
            return Ok((permutation.id, false));
        }
        self.permutations.insert(permutation.id, *permutation);
        Ok((permutation.id, true))
    }

    /// Inserts or finds a class by repr.
    fn classify(
        &mut self,
        repr: &CanonicalRepr,
        size: i64,
    ) -> Result<(GroupClassId, bool), StoreError> {
        if let Some(stored) = self.class_ids.get(repr).and_then(|id| self.classes.get(id)) {
            validation::ensure_class_size_matches(stored, size)?;
            return Ok((stored.id, false));
        }
        self.last_class_id += 1;
        let id = GroupClassId::new(self.last_class_id);
        self.class_ids.insert(repr.clone(), id);
        self.classes.insert(
            id,
            GroupClassRecord {
                id,
                repr: repr.clone(),
                size,
            },
        );
        Ok((id, true))
    }

    /// Inserts or finds a group by repr.
    fn register_group(
        &mut self,
        repr: &CanonicalRepr,
        class_id: GroupClassId,
    ) -> Result<(PermGroupId, bool), StoreError> {
        if let Some(stored) = self.group_ids.get(repr).and_then(|id| self.groups.get(id)) {
            validation::ensure_group_class_matches(stored, class_id)?;
            return Ok((stored.id, false));
        }
        if !self.classes.contains_key(&class_id) {
            return Err(StoreError::ForeignKey {
                table: Table::PermGroup,
                target: Table::GroupClass,
                key: class_id.to_string(),
            });
        }
        self.last_group_id += 1;
        let id = PermGroupId::new(self.last_group_id);
        self.group_ids.insert(repr.clone(), id);
        self.groups.insert(
            id,
            PermGroupRecord {
                id,
                repr: repr.clone(),
                class_id,
            },
        );
        Ok((id, true))
    }

    /// Inserts a membership pair if absent.
    fn attach(
        &mut self,
        group_id: PermGroupId,
        permutation_id: PermutationId,
    ) -> Result<((), bool), StoreError> {
        if !self.groups.contains_key(&group_id) {
            return Err(StoreError::ForeignKey {
                table: Table::GroupElement,
                target: Table::PermGroup,
                key: group_id.to_string(),
            });
        }
        if !self.permutations.contains_key(&permutation_id) {
            return Err(StoreError::ForeignKey {
                table: Table::GroupElement,
                target: Table::Permutation,
                key: permutation_id.to_string(),
            });
        }
        Ok(((), self.elements.insert((group_id, permutation_id))))
    }

    /// Returns the class row or a foreign key error raised on `table`.
    fn class_for(
        &self,
        table: Table,
        class_id: GroupClassId,
    ) -> Result<&GroupClassRecord, StoreError> {
        self.classes.get(&class_id).ok_or_else(|| StoreError::ForeignKey {
            table,
            target: Table::GroupClass,
            key: class_id.to_string(),
        })
    }

    /// Returns the histogram buckets of a class in decomp order.
    fn buckets(&self, class_id: GroupClassId) -> Vec<HistogramBucket> {
        let first = (class_id, CycleDecomp::new(i64::MIN));
        let last = (class_id, CycleDecomp::new(i64::MAX));
        self.histogram
            .range(first ..= last)
            .map(|(&(_, decomp), &count)| HistogramBucket {
                decomp,
                count,
            })
            .collect()
    }

    /// Sums the bucket counts of a class.
    fn histogram_total(&self, class_id: GroupClassId) -> i64 {
        self.buckets(class_id).iter().map(|bucket| bucket.count).sum()
    }

    /// Counts one element of a class.
    fn record_decomp(
        &mut self,
        class_id: GroupClassId,
        decomp: CycleDecomp,
    ) -> Result<((), bool), StoreError> {
        let size = self.class_for(Table::Histogram, class_id)?.size;
        validation::ensure_histogram_open(class_id, size, self.histogram_total(class_id))?;
        let count = self.histogram.entry((class_id, decomp)).or_insert(0);
        *count += 1;
        Ok(((), *count == 1))
    }

    /// Writes a complete class histogram.
    fn record_histogram(
        &mut self,
        class_id: GroupClassId,
        buckets: &[HistogramBucket],
    ) -> Result<((), bool), StoreError> {
        let size = self.class_for(Table::Histogram, class_id)?.size;
        if !self.buckets(class_id).is_empty() {
            return Err(StoreError::Duplicate {
                table: Table::Histogram,
                key: class_id.to_string(),
            });
        }
        validation::validate_class_histogram(class_id, size, buckets)?;
        for bucket in buckets {
            self.histogram.insert((class_id, bucket.decomp), bucket.count);
        }
        Ok(((), true))
    }

    /// Appends a trial.
    fn record_trial(&mut self, trial: &NewTrial) -> Result<(TrialId, bool), StoreError> {
        if !self.graphs.contains_key(&trial.graph_id) {
            return Err(StoreError::ForeignKey {
                table: Table::Trial,
                target: Table::Graph,
                key: trial.graph_id.to_string(),
            });
        }
        if !self.groups.contains_key(&trial.group_id) {
            return Err(StoreError::ForeignKey {
                table: Table::Trial,
                target: Table::PermGroup,
                key: trial.group_id.to_string(),
            });
        }
        if self.trials.values().any(|stored| stored.same_key(trial)) {
            return Err(StoreError::Duplicate {
                table: Table::Trial,
                key: validation::trial_key(trial),
            });
        }
        self.last_trial_id += 1;
        let id = TrialId::new(self.last_trial_id);
        self.trials.insert(id, TrialRecord::from_new(id, trial));
        Ok((id, true))
    }

    /// Returns trials matching `filter`, ordered by time then id.
    fn trials_where(&self, filter: impl Fn(&TrialRecord) -> bool) -> Vec<TrialRecord> {
        let mut trials: Vec<TrialRecord> =
            self.trials.values().filter(|trial| filter(trial)).cloned().collect();
        trials.sort_by(|left, right| {
            left.datetime
                .as_unix_seconds()
                .total_cmp(&right.datetime.as_unix_seconds())
                .then(left.id.cmp(&right.id))
        });
        trials
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// In-memory traversal store for tests and examples.
#[derive(Clone)]
pub struct InMemoryTraversalStore {
    /// Table contents protected by a mutex.
    state: Arc<Mutex<MemoryState>>,
    /// Sink receiving one event per write.
    audit: Arc<dyn StoreAuditSink>,
}

impl Default for InMemoryTraversalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTraversalStore {
    /// Creates an empty store that discards audit events.
    #[must_use]
    pub fn new() -> Self {
        Self::with_audit_sink(Arc::new(NoopAuditSink))
    }

    /// Creates an empty store that reports writes to `audit`.
    #[must_use]
    pub fn with_audit_sink(audit: Arc<dyn StoreAuditSink>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            audit,
        }
    }

    /// Locks the table contents.
    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Store("traversal store mutex poisoned".to_string()))
    }

    /// Runs a write against the locked state and reports its outcome.
    fn write<T>(
        &self,
        operation: StoreOperation,
        table: Table,
        key: String,
        apply: impl FnOnce(&mut MemoryState) -> Result<(T, bool), StoreError>,
    ) -> Result<T, StoreError> {
        let result = self.lock().and_then(|mut state| apply(&mut state));
        record_write(self.audit.as_ref(), operation, table, key, &result, 1, 1);
        result.map(|(value, _)| value)
    }
}

impl CanonicalObjectStore for InMemoryTraversalStore {
    fn intern_graph(&self, graph: &GraphRecord) -> Result<GraphId, StoreError> {
        validation::validate_graph(graph)?;
        self.write(StoreOperation::InternGraph, Table::Graph, graph.id.to_string(), |state| {
            state.intern_graph(graph)
        })
    }

    fn intern_permutation(
        &self,
        permutation: &PermutationRecord,
    ) -> Result<PermutationId, StoreError> {
        validation::validate_permutation(permutation)?;
        self.write(
            StoreOperation::InternPermutation,
            Table::Permutation,
            permutation.id.to_string(),
            |state| state.intern_permutation(permutation),
        )
    }

    fn find_graph(&self, id: GraphId) -> Result<Option<GraphRecord>, StoreError> {
        Ok(self.lock()?.graphs.get(&id).copied())
    }

    fn find_permutation(
        &self,
        id: PermutationId,
    ) -> Result<Option<PermutationRecord>, StoreError> {
        Ok(self.lock()?.permutations.get(&id).copied())
    }
}

impl GroupClassIndex for InMemoryTraversalStore {
    fn classify_or_get(
        &self,
        repr: &CanonicalRepr,
        size: i64,
    ) -> Result<GroupClassId, StoreError> {
        validation::validate_repr(Table::GroupClass, repr)?;
        validation::validate_class_size(size)?;
        self.write(
            StoreOperation::ClassifyGroup,
            Table::GroupClass,
            validation::repr_key(repr),
            |state| state.classify(repr, size),
        )
    }

    fn register_group_or_get(
        &self,
        repr: &CanonicalRepr,
        class_id: GroupClassId,
    ) -> Result<PermGroupId, StoreError> {
        validation::validate_repr(Table::PermGroup, repr)?;
        self.write(
            StoreOperation::RegisterGroup,
            Table::PermGroup,
            validation::repr_key(repr),
            |state| state.register_group(repr, class_id),
        )
    }

    fn attach_element(
        &self,
        group_id: PermGroupId,
        permutation_id: PermutationId,
    ) -> Result<(), StoreError> {
        self.write(
            StoreOperation::AttachElement,
            Table::GroupElement,
            validation::element_key(group_id, permutation_id),
            |state| state.attach(group_id, permutation_id),
        )
    }

    fn find_group_class(
        &self,
        repr: &CanonicalRepr,
    ) -> Result<Option<GroupClassRecord>, StoreError> {
        let state = self.lock()?;
        Ok(state.class_ids.get(repr).and_then(|id| state.classes.get(id)).cloned())
    }

    fn find_perm_group(&self, repr: &CanonicalRepr) -> Result<Option<PermGroupRecord>, StoreError> {
        let state = self.lock()?;
        Ok(state.group_ids.get(repr).and_then(|id| state.groups.get(id)).cloned())
    }

    fn group_elements(&self, group_id: PermGroupId) -> Result<Vec<PermutationId>, StoreError> {
        let first = (group_id, PermutationId::new(i64::MIN));
        let last = (group_id, PermutationId::new(i64::MAX));
        let state = self.lock()?;
        Ok(state
            .elements
            .range(first ..= last)
            .map(|&(_, permutation_id)| permutation_id)
            .collect())
    }

    fn groups_in_class(&self, class_id: GroupClassId) -> Result<Vec<PermGroupRecord>, StoreError> {
        let state = self.lock()?;
        Ok(state.groups.values().filter(|group| group.class_id == class_id).cloned().collect())
    }
}

impl HistogramStore for InMemoryTraversalStore {
    fn record_element_decomp(
        &self,
        class_id: GroupClassId,
        decomp: CycleDecomp,
    ) -> Result<(), StoreError> {
        validation::validate_decomp(decomp)?;
        self.write(
            StoreOperation::RecordElementDecomp,
            Table::Histogram,
            validation::element_key(class_id, decomp),
            |state| state.record_decomp(class_id, decomp),
        )
    }

    fn record_class_histogram(
        &self,
        class_id: GroupClassId,
        buckets: &[HistogramBucket],
    ) -> Result<(), StoreError> {
        self.write(
            StoreOperation::RecordClassHistogram,
            Table::Histogram,
            class_id.to_string(),
            |state| state.record_histogram(class_id, buckets),
        )
    }

    fn histogram_of(&self, class_id: GroupClassId) -> Result<Vec<HistogramBucket>, StoreError> {
        Ok(self.lock()?.buckets(class_id))
    }

    fn check_conservation(
        &self,
        class_id: GroupClassId,
    ) -> Result<ConservationReport, StoreError> {
        let state = self.lock()?;
        let size = state.class_for(Table::Histogram, class_id)?.size;
        Ok(ConservationReport {
            class_id,
            size,
            total: state.histogram_total(class_id),
        })
    }
}

impl TrialLedger for InMemoryTraversalStore {
    fn record_trial(&self, trial: &NewTrial) -> Result<TrialId, StoreError> {
        validation::validate_trial(trial)?;
        self.write(
            StoreOperation::RecordTrial,
            Table::Trial,
            validation::trial_key(trial),
            |state| state.record_trial(trial),
        )
    }

    fn find_trial(&self, id: TrialId) -> Result<Option<TrialRecord>, StoreError> {
        Ok(self.lock()?.trials.get(&id).cloned())
    }

    fn trials_between(
        &self,
        start: TrialTime,
        end: TrialTime,
    ) -> Result<Vec<TrialRecord>, StoreError> {
        validation::validate_time(start)?;
        validation::validate_time(end)?;
        Ok(self.lock()?.trials_where(|trial| start <= trial.datetime && trial.datetime < end))
    }

    fn trials_for_graph(&self, graph_id: GraphId) -> Result<Vec<TrialRecord>, StoreError> {
        Ok(self.lock()?.trials_where(|trial| trial.graph_id == graph_id))
    }
}

impl TraversalStore for InMemoryTraversalStore {
    fn readiness(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }

    fn counts(&self) -> Result<StoreCounts, StoreError> {
        let state = self.lock()?;
        Ok(StoreCounts {
            graphs: state.graphs.len() as u64,
            permutations: state.permutations.len() as u64,
            group_classes: state.classes.len() as u64,
            perm_groups: state.groups.len() as u64,
            group_elements: state.elements.len() as u64,
            histogram_buckets: state.histogram.len() as u64,
            trials: state.trials.len() as u64,
        })
    }
}
