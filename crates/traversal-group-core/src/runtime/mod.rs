// crates/traversal-group-core/src/runtime/mod.rs
// ============================================================================
// Module: Traversal Group Runtime
// Description: In-memory store, retry policy, and discovery ingestion.
// Purpose: Provide backend-neutral helpers built on the store interfaces.
// Dependencies: crate::{audit, core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement the pieces shared by every deployment: the
//! reference in-memory store, the transient retry loop used by durable
//! backends, and the ingestion flow that writes one discovery end to end.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod ingest;
pub mod memory;
pub mod retry;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use ingest::GroupDiscovery;
pub use ingest::IngestOutcome;
pub use ingest::ingest_discovery;
pub use memory::InMemoryTraversalStore;
pub use retry::RetryPolicy;
