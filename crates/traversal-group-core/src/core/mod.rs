// crates/traversal-group-core/src/core/mod.rs
// ============================================================================
// Module: Traversal Group Core Types
// Description: Identifiers, canonical representations, and stored records.
// Purpose: Provide stable, serializable types shared by every store backend.
// Dependencies: serde, serde_jcs, serde_json
// ============================================================================

//! ## Overview
//! Core types describe the rows of the traversal group store. Integer keys
//! are opaque canonical encodings supplied by the external engine; string
//! keys are canonical JSON representations. Validation helpers in
//! [`validation`] are shared by all backends so that every store rejects the
//! same inputs with the same errors.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod canonical;
pub mod identifiers;
pub mod records;
pub mod time;
pub mod validation;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use canonical::CanonicalRepr;
pub use canonical::CanonicalReprError;
pub use canonical::MAX_REPR_BYTES;
pub use identifiers::CycleDecomp;
pub use identifiers::GraphId;
pub use identifiers::GroupClassId;
pub use identifiers::MethodTag;
pub use identifiers::NodeSubset;
pub use identifiers::PermGroupId;
pub use identifiers::PermutationId;
pub use identifiers::TrialId;
pub use records::ConservationReport;
pub use records::GraphRecord;
pub use records::GroupClassRecord;
pub use records::HistogramBucket;
pub use records::NewTrial;
pub use records::PermGroupRecord;
pub use records::PermutationRecord;
pub use records::StoreCounts;
pub use records::TrialRecord;
pub use time::TrialTime;
