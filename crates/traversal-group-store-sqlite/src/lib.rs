// crates/traversal-group-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Traversal Store
// Description: Durable traversal group store backend using SQLite WAL.
// Purpose: Persist deduplicated graphs, groups, histograms, and trials.
// Dependencies: traversal-group-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`TraversalStore`] implementation.
//! Every write runs in an immediate transaction so that check-then-insert is
//! atomic across threads and processes sharing one database file. Reads are
//! served from a small connection pool and a bounded cache of immutable rows.
//!
//! [`TraversalStore`]: traversal_group_core::TraversalStore

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod cache;
pub mod queries;
pub mod schema;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use cache::CacheStats;
pub use schema::SCHEMA_VERSION;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
pub use store::SqliteTraversalStore;
