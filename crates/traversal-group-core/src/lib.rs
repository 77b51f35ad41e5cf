// crates/traversal-group-core/src/lib.rs
// ============================================================================
// Module: Traversal Group Core Library
// Description: Public API surface for the traversal group store core.
// Purpose: Expose canonical records, store interfaces, and runtime helpers.
// Dependencies: crate::{audit, core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Traversal group core defines the canonical records produced by the
//! traversal-group experiment (graphs, permutations, permutation groups,
//! group classes, cycle-decomposition histograms, and trials) together with
//! the insert-or-find interfaces every store backend implements. Encodings
//! are computed by an external engine; this crate only deduplicates and links
//! them.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditOutcome;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use audit::StoreAuditEvent;
pub use audit::StoreAuditSink;
pub use audit::StoreOperation;
pub use core::*;
pub use interfaces::CanonicalObjectStore;
pub use interfaces::GroupClassIndex;
pub use interfaces::HistogramStore;
pub use interfaces::StoreError;
pub use interfaces::Table;
pub use interfaces::TraversalStore;
pub use interfaces::TrialLedger;
pub use runtime::GroupDiscovery;
pub use runtime::InMemoryTraversalStore;
pub use runtime::IngestOutcome;
pub use runtime::RetryPolicy;
pub use runtime::ingest_discovery;
