// crates/traversal-group-config/src/lib.rs
// ============================================================================
// Module: Traversal Group Config Library
// Description: Canonical config model and validation for the traversal store.
// Purpose: Single source of truth for traversal-group.toml semantics.
// Dependencies: traversal-group-core, traversal-group-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `traversal-group-config` defines the TOML configuration model for the
//! traversal group store. It validates fail-closed and builds a configured
//! [`traversal_group_store_sqlite::SqliteTraversalStore`] with its retry
//! policy and audit sink.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
