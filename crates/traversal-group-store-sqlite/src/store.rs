// crates/traversal-group-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Traversal Store
// Description: Durable TraversalStore backed by SQLite WAL.
// Purpose: Serialize writes through immediate transactions and pool reads.
// Dependencies: traversal-group-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! [`SqliteTraversalStore`] owns one writer connection and a round-robin pool
//! of reader connections. Each write opens a `BEGIN IMMEDIATE` transaction,
//! which takes the database write lock up front, so the existence check and
//! the insert that follows cannot interleave with another writer in this or
//! any other process. Contention that outlasts the busy timeout surfaces as
//! [`StoreError::Transient`]; intern, classify, register, and attach retry it
//! according to the configured [`RetryPolicy`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::Transaction;
use rusqlite::TransactionBehavior;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use traversal_group_core::CanonicalObjectStore;
use traversal_group_core::CanonicalRepr;
use traversal_group_core::ConservationReport;
use traversal_group_core::CycleDecomp;
use traversal_group_core::GraphId;
use traversal_group_core::GraphRecord;
use traversal_group_core::GroupClassId;
use traversal_group_core::GroupClassIndex;
use traversal_group_core::GroupClassRecord;
use traversal_group_core::HistogramBucket;
use traversal_group_core::HistogramStore;
use traversal_group_core::NewTrial;
use traversal_group_core::NoopAuditSink;
use traversal_group_core::PermGroupId;
use traversal_group_core::PermGroupRecord;
use traversal_group_core::PermutationId;
use traversal_group_core::PermutationRecord;
use traversal_group_core::RetryPolicy;
use traversal_group_core::StoreAuditSink;
use traversal_group_core::StoreCounts;
use traversal_group_core::StoreError;
use traversal_group_core::StoreOperation;
use traversal_group_core::Table;
use traversal_group_core::TraversalStore;
use traversal_group_core::TrialId;
use traversal_group_core::TrialLedger;
use traversal_group_core::TrialRecord;
use traversal_group_core::TrialTime;
use traversal_group_core::audit::record_write;
use traversal_group_core::core::validation;

use crate::cache::CacheStats;
use crate::cache::LookupCache;
use crate::queries;
use crate::schema::initialize_schema;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Default number of reader connections.
const DEFAULT_READ_POOL_SIZE: usize = 4;
/// Maximum number of reader connections.
const MAX_READ_POOL_SIZE: usize = 64;
/// Default lookup cache capacity per table.
const DEFAULT_LOOKUP_CACHE_ENTRIES: usize = 4_096;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` traversal store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
    /// Number of reader connections.
    #[serde(default = "default_read_pool_size")]
    pub read_pool_size: usize,
    /// Lookup cache capacity per table; zero disables the cache.
    #[serde(default = "default_lookup_cache_entries")]
    pub lookup_cache_entries: usize,
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Returns the default reader pool size.
const fn default_read_pool_size() -> usize {
    DEFAULT_READ_POOL_SIZE
}

/// Returns the default lookup cache capacity.
const fn default_lookup_cache_entries() -> usize {
    DEFAULT_LOOKUP_CACHE_ENTRIES
}

impl SqliteStoreConfig {
    /// Creates a configuration with default settings for `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
            read_pool_size: default_read_pool_size(),
            lookup_cache_entries: default_lookup_cache_entries(),
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Invalid`] when a setting is out of range.
    pub fn validate(&self) -> Result<(), SqliteStoreError> {
        validate_store_path(&self.path)?;
        if self.read_pool_size == 0 || self.read_pool_size > MAX_READ_POOL_SIZE {
            return Err(SqliteStoreError::Invalid(format!(
                "read_pool_size out of range: {} (1..={MAX_READ_POOL_SIZE})",
                self.read_pool_size
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store open and initialization errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store configuration.
    #[error("sqlite store invalid config: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed traversal store with WAL support.
///
/// # Invariants
/// - Every write runs in one immediate transaction on the writer connection.
/// - Cached rows are immutable and were read from committed data.
#[derive(Clone)]
pub struct SqliteTraversalStore {
    /// Store configuration.
    config: SqliteStoreConfig,
    /// Shared writer connection guarded by a mutex.
    write_connection: Arc<Mutex<Connection>>,
    /// Reader connections used for read path isolation under WAL.
    read_connections: Arc<Vec<Mutex<Connection>>>,
    /// Round-robin cursor for read connection selection.
    read_cursor: Arc<AtomicUsize>,
    /// Positive lookup cache.
    cache: Arc<Mutex<LookupCache>>,
    /// Retry policy for idempotent writes.
    retry: RetryPolicy,
    /// Sink receiving one event per write attempt.
    audit: Arc<dyn StoreAuditSink>,
}

impl SqliteTraversalStore {
    /// Opens an `SQLite`-backed traversal store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        config.validate()?;
        ensure_parent_dir(&config.path)?;
        let mut write_connection = open_connection(&config)?;
        initialize_schema(&mut write_connection)?;
        let mut read_connections = Vec::with_capacity(config.read_pool_size);
        for _ in 0 .. config.read_pool_size {
            read_connections.push(Mutex::new(open_connection(&config)?));
        }
        Ok(Self {
            cache: Arc::new(Mutex::new(LookupCache::new(config.lookup_cache_entries))),
            config,
            write_connection: Arc::new(Mutex::new(write_connection)),
            read_connections: Arc::new(read_connections),
            read_cursor: Arc::new(AtomicUsize::new(0)),
            retry: RetryPolicy::default(),
            audit: Arc::new(NoopAuditSink),
        })
    }

    /// Replaces the retry policy for idempotent writes.
    #[must_use]
    pub const fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replaces the audit sink.
    #[must_use]
    pub fn with_audit_sink(mut self, audit: Arc<dyn StoreAuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Returns the store configuration.
    #[must_use]
    pub const fn config(&self) -> &SqliteStoreConfig {
        &self.config
    }

    /// Returns lookup cache counters.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).stats()
    }

    /// Runs `apply` inside an immediate transaction on the writer connection.
    fn with_write_tx<T>(
        &self,
        table: Table,
        apply: impl FnOnce(&Transaction<'_>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self
            .write_connection
            .lock()
            .map_err(|_| StoreError::Store("sqlite writer mutex poisoned".to_string()))?;
        let tx = guard
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|err| queries::db_error(table, err))?;
        let value = apply(&tx)?;
        tx.commit().map_err(|err| queries::db_error(table, err))?;
        drop(guard);
        Ok(value)
    }

    /// Runs a write under `policy`, reporting every attempt to the audit sink.
    fn write<T>(
        &self,
        operation: StoreOperation,
        table: Table,
        key: &str,
        policy: RetryPolicy,
        apply: impl Fn(&Transaction<'_>) -> Result<(T, bool), StoreError>,
    ) -> Result<T, StoreError> {
        policy.run(|attempt| {
            let result = self.with_write_tx(table, &apply);
            record_write(
                self.audit.as_ref(),
                operation,
                table,
                key.to_string(),
                &result,
                attempt,
                policy.max_attempts.max(1),
            );
            result.map(|(value, _)| value)
        })
    }

    /// Returns the next read connection using round-robin selection.
    fn read_connection(&self) -> &Mutex<Connection> {
        let len = self.read_connections.len();
        let index = self.read_cursor.fetch_add(1, Ordering::Relaxed) % len;
        &self.read_connections[index]
    }

    /// Runs `read` on a pooled reader connection.
    fn with_read<T>(
        &self,
        table: Table,
        read: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, StoreError> {
        let guard = self
            .read_connection()
            .lock()
            .map_err(|_| StoreError::Store("sqlite read mutex poisoned".to_string()))?;
        read(&guard).map_err(|err| queries::db_error(table, err))
    }

    /// Runs `f` against the lookup cache.
    fn cached<T>(&self, f: impl FnOnce(&mut LookupCache) -> T) -> T {
        let mut guard = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl CanonicalObjectStore for SqliteTraversalStore {
    fn intern_graph(&self, graph: &GraphRecord) -> Result<GraphId, StoreError> {
        validation::validate_graph(graph)?;
        let key = graph.id.to_string();
        if let Some(stored) = self.cached(|cache| cache.graphs.get(&graph.id)) {
            let result =
                validation::ensure_graph_matches(&stored, graph).map(|()| (graph.id, false));
            record_write(
                self.audit.as_ref(),
                StoreOperation::InternGraph,
                Table::Graph,
                key,
                &result,
                1,
                1,
            );
            return result.map(|(id, _)| id);
        }
        let id = self.write(StoreOperation::InternGraph, Table::Graph, &key, self.retry, |tx| {
            queries::intern_graph(tx, graph)
        })?;
        self.cached(|cache| cache.graphs.insert(id, *graph));
        Ok(id)
    }

    fn intern_permutation(
        &self,
        permutation: &PermutationRecord,
    ) -> Result<PermutationId, StoreError> {
        validation::validate_permutation(permutation)?;
        let key = permutation.id.to_string();
        if let Some(stored) = self.cached(|cache| cache.permutations.get(&permutation.id)) {
            let result = validation::ensure_permutation_matches(&stored, permutation)
                .map(|()| (permutation.id, false));
            record_write(
                self.audit.as_ref(),
                StoreOperation::InternPermutation,
                Table::Permutation,
                key,
                &result,
                1,
                1,
            );
            return result.map(|(id, _)| id);
        }
        let id = self.write(
            StoreOperation::InternPermutation,
            Table::Permutation,
            &key,
            self.retry,
            |tx| queries::intern_permutation(tx, permutation),
        )?;
        self.cached(|cache| cache.permutations.insert(id, *permutation));
        Ok(id)
    }

    fn find_graph(&self, id: GraphId) -> Result<Option<GraphRecord>, StoreError> {
        if let Some(stored) = self.cached(|cache| cache.graphs.get(&id)) {
            return Ok(Some(stored));
        }
        let found = self.with_read(Table::Graph, |conn| queries::select_graph(conn, id))?;
        if let Some(stored) = found {
            self.cached(|cache| cache.graphs.insert(id, stored));
        }
        Ok(found)
    }

    fn find_permutation(
        &self,
        id: PermutationId,
    ) -> Result<Option<PermutationRecord>, StoreError> {
        if let Some(stored) = self.cached(|cache| cache.permutations.get(&id)) {
            return Ok(Some(stored));
        }
        let found =
            self.with_read(Table::Permutation, |conn| queries::select_permutation(conn, id))?;
        if let Some(stored) = found {
            self.cached(|cache| cache.permutations.insert(id, stored));
        }
        Ok(found)
    }
}

impl GroupClassIndex for SqliteTraversalStore {
    fn classify_or_get(
        &self,
        repr: &CanonicalRepr,
        size: i64,
    ) -> Result<GroupClassId, StoreError> {
        validation::validate_repr(Table::GroupClass, repr)?;
        validation::validate_class_size(size)?;
        let key = validation::repr_key(repr);
        if let Some(stored) = self.cached(|cache| cache.classes.get(repr)) {
            let result =
                validation::ensure_class_size_matches(&stored, size).map(|()| (stored.id, false));
            record_write(
                self.audit.as_ref(),
                StoreOperation::ClassifyGroup,
                Table::GroupClass,
                key,
                &result,
                1,
                1,
            );
            return result.map(|(id, _)| id);
        }
        let record =
            self.write(StoreOperation::ClassifyGroup, Table::GroupClass, &key, self.retry, |tx| {
                queries::classify(tx, repr, size)
            })?;
        let id = record.id;
        self.cached(|cache| cache.classes.insert(repr.clone(), record));
        Ok(id)
    }

    fn register_group_or_get(
        &self,
        repr: &CanonicalRepr,
        class_id: GroupClassId,
    ) -> Result<PermGroupId, StoreError> {
        validation::validate_repr(Table::PermGroup, repr)?;
        let key = validation::repr_key(repr);
        if let Some(stored) = self.cached(|cache| cache.groups.get(repr)) {
            let result = validation::ensure_group_class_matches(&stored, class_id)
                .map(|()| (stored.id, false));
            record_write(
                self.audit.as_ref(),
                StoreOperation::RegisterGroup,
                Table::PermGroup,
                key,
                &result,
                1,
                1,
            );
            return result.map(|(id, _)| id);
        }
        let record =
            self.write(StoreOperation::RegisterGroup, Table::PermGroup, &key, self.retry, |tx| {
                queries::register_group(tx, repr, class_id)
            })?;
        let id = record.id;
        self.cached(|cache| cache.groups.insert(repr.clone(), record));
        Ok(id)
    }

    fn attach_element(
        &self,
        group_id: PermGroupId,
        permutation_id: PermutationId,
    ) -> Result<(), StoreError> {
        self.write(
            StoreOperation::AttachElement,
            Table::GroupElement,
            &validation::element_key(group_id, permutation_id),
            self.retry,
            |tx| queries::attach_element(tx, group_id, permutation_id),
        )
    }

    fn find_group_class(
        &self,
        repr: &CanonicalRepr,
    ) -> Result<Option<GroupClassRecord>, StoreError> {
        if let Some(stored) = self.cached(|cache| cache.classes.get(repr)) {
            return Ok(Some(stored));
        }
        let found =
            self.with_read(Table::GroupClass, |conn| queries::select_group_class(conn, repr))?;
        if let Some(stored) = &found {
            self.cached(|cache| cache.classes.insert(repr.clone(), stored.clone()));
        }
        Ok(found)
    }

    fn find_perm_group(&self, repr: &CanonicalRepr) -> Result<Option<PermGroupRecord>, StoreError> {
        if let Some(stored) = self.cached(|cache| cache.groups.get(repr)) {
            return Ok(Some(stored));
        }
        let found =
            self.with_read(Table::PermGroup, |conn| queries::select_perm_group(conn, repr))?;
        if let Some(stored) = &found {
            self.cached(|cache| cache.groups.insert(repr.clone(), stored.clone()));
        }
        Ok(found)
    }

    fn group_elements(&self, group_id: PermGroupId) -> Result<Vec<PermutationId>, StoreError> {
        self.with_read(Table::GroupElement, |conn| queries::select_group_elements(conn, group_id))
    }

    fn groups_in_class(&self, class_id: GroupClassId) -> Result<Vec<PermGroupRecord>, StoreError> {
        self.with_read(Table::PermGroup, |conn| queries::select_groups_in_class(conn, class_id))
    }
}

impl HistogramStore for SqliteTraversalStore {
    fn record_element_decomp(
        &self,
        class_id: GroupClassId,
        decomp: CycleDecomp,
    ) -> Result<(), StoreError> {
        validation::validate_decomp(decomp)?;
        self.write(
            StoreOperation::RecordElementDecomp,
            Table::Histogram,
            &validation::element_key(class_id, decomp),
            RetryPolicy::no_retry(),
            |tx| queries::record_element_decomp(tx, class_id, decomp),
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
            &class_id.to_string(),
            RetryPolicy::no_retry(),
            |tx| queries::record_class_histogram(tx, class_id, buckets),
        )
    }

    fn histogram_of(&self, class_id: GroupClassId) -> Result<Vec<HistogramBucket>, StoreError> {
        self.with_read(Table::Histogram, |conn| queries::select_histogram(conn, class_id))
    }

    fn check_conservation(
        &self,
        class_id: GroupClassId,
    ) -> Result<ConservationReport, StoreError> {
        self.with_read(Table::Histogram, |conn| queries::select_conservation(conn, class_id))?
            .ok_or_else(|| StoreError::ForeignKey {
                table: Table::Histogram,
                target: Table::GroupClass,
                key: class_id.to_string(),
            })
    }
}

impl TrialLedger for SqliteTraversalStore {
    fn record_trial(&self, trial: &NewTrial) -> Result<TrialId, StoreError> {
        validation::validate_trial(trial)?;
        self.write(
            StoreOperation::RecordTrial,
            Table::Trial,
            &validation::trial_key(trial),
            RetryPolicy::no_retry(),
            |tx| queries::record_trial(tx, trial),
        )
    }

    fn find_trial(&self, id: TrialId) -> Result<Option<TrialRecord>, StoreError> {
        self.with_read(Table::Trial, |conn| queries::select_trial(conn, id))
    }

    fn trials_between(
        &self,
        start: TrialTime,
        end: TrialTime,
    ) -> Result<Vec<TrialRecord>, StoreError> {
        validation::validate_time(start)?;
        validation::validate_time(end)?;
        self.with_read(Table::Trial, |conn| queries::select_trials_between(conn, start, end))
    }

    fn trials_for_graph(&self, graph_id: GraphId) -> Result<Vec<TrialRecord>, StoreError> {
        self.with_read(Table::Trial, |conn| queries::select_trials_for_graph(conn, graph_id))
    }
}

impl TraversalStore for SqliteTraversalStore {
    fn readiness(&self) -> Result<(), StoreError> {
        self.with_read(Table::Graph, |conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
        })?;
        self.with_write_tx(Table::Graph, |tx| {
            tx.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .map_err(|err| queries::db_error(Table::Graph, err))
        })?;
        Ok(())
    }

    fn counts(&self) -> Result<StoreCounts, StoreError> {
        self.with_read(Table::Graph, queries::select_counts)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability and integrity.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}
