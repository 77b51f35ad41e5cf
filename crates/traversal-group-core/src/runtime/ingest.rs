// crates/traversal-group-core/src/runtime/ingest.rs
// ============================================================================
// Module: Discovery Ingestion
// Description: Writes one discovered group and its trial in dependency order.
// Purpose: Compose the store operations the experiment loop performs per trial.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! A traversal trial discovers a permutation group on a graph. Ingestion
//! interns the graph, and when the group has not been seen before it interns
//! the elements, classifies the group, writes the class histogram for a fresh
//! class, and registers the group with its elements. The trial is recorded
//! last so it always references rows that already exist.
//!
//! Every step is insert-or-find, so re-running an interrupted ingestion
//! resumes where the previous run stopped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::CanonicalRepr;
use crate::core::CycleDecomp;
use crate::core::GraphId;
use crate::core::GraphRecord;
use crate::core::GroupClassId;
use crate::core::HistogramBucket;
use crate::core::MethodTag;
use crate::core::NewTrial;
use crate::core::NodeSubset;
use crate::core::PermGroupId;
use crate::core::PermutationRecord;
use crate::core::TrialId;
use crate::core::TrialTime;
use crate::interfaces::StoreError;
use crate::interfaces::TraversalStore;

// ============================================================================
// SECTION: Types
// ============================================================================

/// One group discovered by a traversal trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDiscovery {
    /// Graph the trial ran against.
    pub graph: GraphRecord,
    /// Encoded subset of starting nodes.
    pub nodes: NodeSubset,
    /// Traversal method tag.
    pub method: MethodTag,
    /// Canonical listing of the discovered group.
    pub group_repr: CanonicalRepr,
    /// Canonical signature of the group's class.
    pub class_repr: CanonicalRepr,
    /// Group elements with their cycle types.
    pub elements: Vec<PermutationRecord>,
    /// Instant the trial ran.
    pub datetime: TrialTime,
}

/// Ids written or found while ingesting a discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestOutcome {
    /// Graph id.
    pub graph_id: GraphId,
    /// Group id.
    pub group_id: PermGroupId,
    /// Class id.
    pub class_id: GroupClassId,
    /// Recorded trial id.
    pub trial_id: TrialId,
    /// True when this ingestion registered the group.
    pub new_group: bool,
    /// True when this ingestion created the class.
    pub new_class: bool,
}

impl GroupDiscovery {
    /// Returns the group order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] when the element list is empty or
    /// repeats a permutation.
    pub fn group_size(&self) -> Result<i64, StoreError> {
        if self.elements.is_empty() {
            return Err(StoreError::Invalid(format!(
                "discovered group has no elements: {}",
                self.group_repr
            )));
        }
        let unique: BTreeSet<_> = self.elements.iter().map(|element| element.id).collect();
        if unique.len() != self.elements.len() {
            return Err(StoreError::Invalid(format!(
                "discovered group repeats an element: {}",
                self.group_repr
            )));
        }
        i64::try_from(self.elements.len())
            .map_err(|_| StoreError::Invalid("discovered group is too large".to_string()))
    }

    /// Builds the cycle-type histogram of the elements.
    #[must_use]
    pub fn histogram(&self) -> Vec<HistogramBucket> {
        let mut counts: BTreeMap<CycleDecomp, i64> = BTreeMap::new();
        for element in &self.elements {
            *counts.entry(element.cycle_decomp).or_insert(0) += 1;
        }
        counts
            .into_iter()
            .map(|(decomp, count)| HistogramBucket {
                decomp,
                count,
            })
            .collect()
    }
}

// ============================================================================
// SECTION: Ingestion
// ============================================================================

/// Writes a discovery and its trial.
///
/// # Errors
///
/// Returns [`StoreError`] from the first store operation that fails. Rows
/// written before the failure stay in place and are found again on retry.
pub fn ingest_discovery<S>(
    store: &S,
    discovery: &GroupDiscovery,
) -> Result<IngestOutcome, StoreError>
where
    S: TraversalStore + ?Sized,
{
    let size = discovery.group_size()?;
    let graph_id = store.intern_graph(&discovery.graph)?;

    let (group_id, class_id, new_group, new_class) =
        match store.find_perm_group(&discovery.group_repr)? {
            Some(group) => (group.id, group.class_id, false, false),
            None => {
                for element in &discovery.elements {
                    store.intern_permutation(element)?;
                }
                let new_class = store.find_group_class(&discovery.class_repr)?.is_none();
                let class_id = store.classify_or_get(&discovery.class_repr, size)?;
                if store.check_conservation(class_id)?.total == 0 {
                    match store.record_class_histogram(class_id, &discovery.histogram()) {
                        Ok(()) | Err(StoreError::Duplicate { .. }) => {}
                        Err(err) => return Err(err),
                    }
                }
                let group_id = store.register_group_or_get(&discovery.group_repr, class_id)?;
                for element in &discovery.elements {
                    store.attach_element(group_id, element.id)?;
                }
                (group_id, class_id, true, new_class)
            }
        };

    let trial_id = store.record_trial(&NewTrial {
        graph_id,
        nodes: discovery.nodes,
        method: discovery.method.clone(),
        group_id,
        datetime: discovery.datetime,
    })?;
    Ok(IngestOutcome {
        graph_id,
        group_id,
        class_id,
        trial_id,
        new_group,
        new_class,
    })
}
