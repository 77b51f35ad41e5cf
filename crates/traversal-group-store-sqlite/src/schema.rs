// crates/traversal-group-store-sqlite/src/schema.rs
// ============================================================================
// Module: SQLite Traversal Schema
// Description: Table layout, indexes, and immutability triggers.
// Purpose: Create or verify the persisted layout of the traversal store.
// Dependencies: rusqlite
// ============================================================================

//! ## Overview
//! The schema mirrors the logical tables one-to-one. Uniqueness and foreign
//! keys are declared in SQL, and triggers reject any update or delete of a
//! committed row. Histogram rows are the one exception: their count may grow.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::TransactionBehavior;
use rusqlite::params;

use crate::store::SqliteStoreError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
pub const SCHEMA_VERSION: i64 = 1;

/// Tables and indexes of schema version 1.
const TABLES_V1: &str = "
CREATE TABLE IF NOT EXISTS graph (
    id INTEGER PRIMARY KEY,
    nodes INTEGER NOT NULL CHECK (nodes >= 0),
    edges INTEGER NOT NULL CHECK (edges >= 0)
);
CREATE TABLE IF NOT EXISTS permutation (
    id INTEGER PRIMARY KEY,
    cycle_decomp INTEGER NOT NULL CHECK (cycle_decomp > 0)
);
CREATE TABLE IF NOT EXISTS group_class (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    repr TEXT NOT NULL UNIQUE,
    size INTEGER NOT NULL CHECK (size > 0)
);
CREATE TABLE IF NOT EXISTS perm_group (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    repr TEXT NOT NULL UNIQUE,
    cls INTEGER NOT NULL REFERENCES group_class(id)
);
CREATE TABLE IF NOT EXISTS group_element (
    grp INTEGER NOT NULL REFERENCES perm_group(id),
    elt INTEGER NOT NULL REFERENCES permutation(id),
    PRIMARY KEY (grp, elt)
) WITHOUT ROWID;
CREATE TABLE IF NOT EXISTS histogram (
    id INTEGER NOT NULL REFERENCES group_class(id),
    decomp INTEGER NOT NULL CHECK (decomp > 0),
    count INTEGER NOT NULL CHECK (count > 0),
    PRIMARY KEY (id, decomp)
) WITHOUT ROWID;
CREATE TABLE IF NOT EXISTS trial (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    graph INTEGER NOT NULL REFERENCES graph(id),
    nodes INTEGER NOT NULL,
    method TEXT NOT NULL,
    grp INTEGER NOT NULL REFERENCES perm_group(id),
    datetime REAL NOT NULL,
    UNIQUE (graph, nodes, method, datetime)
);
CREATE INDEX IF NOT EXISTS idx_trial_datetime ON trial (datetime);
CREATE INDEX IF NOT EXISTS idx_trial_graph ON trial (graph);
CREATE INDEX IF NOT EXISTS idx_perm_group_cls ON perm_group (cls);
";

/// Tables whose rows never change once committed.
const IMMUTABLE_TABLES: [&str; 6] =
    ["graph", "permutation", "group_class", "perm_group", "group_element", "trial"];

/// Triggers limiting histogram rows to count increments.
const HISTOGRAM_TRIGGERS_V1: &str = "
CREATE TRIGGER IF NOT EXISTS histogram_count_only_grows
BEFORE UPDATE ON histogram
WHEN NEW.id != OLD.id OR NEW.decomp != OLD.decomp OR NEW.count <= OLD.count
BEGIN
    SELECT RAISE(ABORT, 'histogram rows may only increase their count');
END;
CREATE TRIGGER IF NOT EXISTS histogram_no_delete
BEFORE DELETE ON histogram
BEGIN
    SELECT RAISE(ABORT, 'histogram rows are append-only');
END;
";

// ============================================================================
// SECTION: Initialization
// ============================================================================

/// Initializes the `SQLite` schema or validates the existing version.
///
/// # Errors
///
/// Returns [`SqliteStoreError::VersionMismatch`] for unknown versions and
/// [`SqliteStoreError::Db`] when DDL fails.
pub fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute_batch(TABLES_V1).map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute_batch(&immutability_triggers())
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute_batch(HISTOGRAM_TRIGGERS_V1)
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Builds the update and delete guards for every immutable table.
fn immutability_triggers() -> String {
    IMMUTABLE_TABLES
        .iter()
        .map(|table| {
            format!(
                "CREATE TRIGGER IF NOT EXISTS {table}_no_update BEFORE UPDATE ON {table}
                 BEGIN SELECT RAISE(ABORT, '{table} rows are immutable'); END;
                 CREATE TRIGGER IF NOT EXISTS {table}_no_delete BEFORE DELETE ON {table}
                 BEGIN SELECT RAISE(ABORT, '{table} rows are immutable'); END;"
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
