// crates/traversal-group-store-sqlite/src/queries.rs
// ============================================================================
// Module: SQLite Traversal Queries
// Description: Statement-level reads and insert-or-find writes.
// Purpose: Keep SQL in one place, independent of connection management.
// Dependencies: traversal-group-core, rusqlite
// ============================================================================

//! ## Overview
//! Write functions expect to run inside an immediate transaction opened by
//! the store; they check, insert, and report whether a row was created.
//! Read functions run a single statement so each sees one snapshot.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::params;
use traversal_group_core::CanonicalRepr;
use traversal_group_core::ConservationReport;
use traversal_group_core::CycleDecomp;
use traversal_group_core::GraphId;
use traversal_group_core::GraphRecord;
use traversal_group_core::GroupClassId;
use traversal_group_core::GroupClassRecord;
use traversal_group_core::HistogramBucket;
use traversal_group_core::MethodTag;
use traversal_group_core::NewTrial;
use traversal_group_core::NodeSubset;
use traversal_group_core::PermGroupId;
use traversal_group_core::PermGroupRecord;
use traversal_group_core::PermutationId;
use traversal_group_core::PermutationRecord;
use traversal_group_core::StoreCounts;
use traversal_group_core::StoreError;
use traversal_group_core::Table;
use traversal_group_core::TrialId;
use traversal_group_core::TrialRecord;
use traversal_group_core::TrialTime;
use traversal_group_core::core::validation;

// ============================================================================
// SECTION: Error Mapping
// ============================================================================

/// Maps a `SQLite` error raised while working on `table`.
#[must_use]
pub fn db_error(table: Table, err: rusqlite::Error) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if matches!(failure.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) =>
        {
            StoreError::Transient {
                table,
                message: err.to_string(),
            }
        }
        _ => StoreError::Store(format!("{table}: {err}")),
    }
}

/// Returns a closure mapping `SQLite` errors for `table`.
fn on(table: Table) -> impl Fn(rusqlite::Error) -> StoreError {
    move |err| db_error(table, err)
}

// ============================================================================
// SECTION: Row Decoding
// ============================================================================

/// Column list for trial reads.
const TRIAL_COLUMNS: &str = "id, graph, nodes, method, grp, datetime";

/// Decodes a trial row selected with [`TRIAL_COLUMNS`].
fn trial_from_row(row: &Row<'_>) -> rusqlite::Result<TrialRecord> {
    Ok(TrialRecord {
        id: TrialId::new(row.get(0)?),
        graph_id: GraphId::new(row.get(1)?),
        nodes: NodeSubset::new(row.get(2)?),
        method: MethodTag::new(row.get::<_, String>(3)?),
        group_id: PermGroupId::new(row.get(4)?),
        datetime: TrialTime::from_unix_seconds(row.get(5)?),
    })
}

/// Converts a `COUNT(*)` result.
fn count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

// ============================================================================
// SECTION: Canonical Objects
// ============================================================================

/// Loads a graph row.
///
/// # Errors
///
/// Returns [`rusqlite::Error`] when the query fails.
pub fn select_graph(conn: &Connection, id: GraphId) -> rusqlite::Result<Option<GraphRecord>> {
    conn.query_row("SELECT nodes, edges FROM graph WHERE id = ?1", params![id.get()], |row| {
        Ok(GraphRecord {
            id,
            nodes: row.get(0)?,
            edges: row.get(1)?,
        })
    })
    .optional()
}

/// Loads a permutation row.
///
/// # Errors
///
/// Returns [`rusqlite::Error`] when the query fails.
pub fn select_permutation(
    conn: &Connection,
    id: PermutationId,
) -> rusqlite::Result<Option<PermutationRecord>> {
    conn.query_row(
        "SELECT cycle_decomp FROM permutation WHERE id = ?1",
        params![id.get()],
        |row| {
            Ok(PermutationRecord {
                id,
                cycle_decomp: CycleDecomp::new(row.get(0)?),
            })
        },
    )
    .optional()
}

/// Inserts or finds a graph.
///
/// # Errors
///
/// Returns [`StoreError::Consistency`] when attributes differ.
pub fn intern_graph(conn: &Connection, graph: &GraphRecord) -> Result<(GraphId, bool), StoreError> {
    if let Some(stored) = select_graph(conn, graph.id).map_err(on(Table::Graph))? {
        validation::ensure_graph_matches(&stored, graph)?;
        return Ok((graph.id, false));
    }
    conn.execute(
        "INSERT INTO graph (id, nodes, edges) VALUES (?1, ?2, ?3)",
        params![graph.id.get(), graph.nodes, graph.edges],
    )
    .map_err(on(Table::Graph))?;
    Ok((graph.id, true))
}

/// Inserts or finds a permutation.
///
/// # Errors
///
/// Returns [`StoreError::Consistency`] when the decomps differ.
pub fn intern_permutation(
    conn: &Connection,
    permutation: &PermutationRecord,
) -> Result<(PermutationId, bool), StoreError> {
    if let Some(stored) =
        select_permutation(conn, permutation.id).map_err(on(Table::Permutation))?
    {
        validation::ensure_permutation_matches(&stored, permutation)?;
        return Ok((permutation.id, false));
    }
    conn.execute(
        "INSERT INTO permutation (id, cycle_decomp) VALUES (?1, ?2)",
        params![permutation.id.get(), permutation.cycle_decomp.get()],
    )
    .map_err(on(Table::Permutation))?;
    Ok((permutation.id, true))
}

// ============================================================================
// SECTION: Group Classification
// ============================================================================

/// Loads a class row by repr.
///
/// # Errors
///
/// Returns [`rusqlite::Error`] when the query fails.
pub fn select_group_class(
    conn: &Connection,
    repr: &CanonicalRepr,
) -> rusqlite::Result<Option<GroupClassRecord>> {
    conn.query_row(
        "SELECT id, size FROM group_class WHERE repr = ?1",
        params![repr.as_str()],
        |row| {
            Ok(GroupClassRecord {
                id: GroupClassId::new(row.get(0)?),
                repr: repr.clone(),
                size: row.get(1)?,
            })
        },
    )
    .optional()
}

/// Loads a group row by repr.
///
/// # Errors
///
/// Returns [`rusqlite::Error`] when the query fails.
pub fn select_perm_group(
    conn: &Connection,
    repr: &CanonicalRepr,
) -> rusqlite::Result<Option<PermGroupRecord>> {
    conn.query_row(
        "SELECT id, cls FROM perm_group WHERE repr = ?1",
        params![repr.as_str()],
        |row| {
            Ok(PermGroupRecord {
                id: PermGroupId::new(row.get(0)?),
                repr: repr.clone(),
                class_id: GroupClassId::new(row.get(1)?),
            })
        },
    )
    .optional()
}

/// Returns true when a row with `id` exists in `table`.
fn row_exists(conn: &Connection, table: Table, id: i64) -> Result<bool, StoreError> {
    conn.query_row(
        &format!("SELECT EXISTS (SELECT 1 FROM {table} WHERE id = ?1)"),
        params![id],
        |row| row.get(0),
    )
    .map_err(on(table))
}

/// Fails with a foreign key error raised on `table` unless `target` has `id`.
fn ensure_exists(
    conn: &Connection,
    table: Table,
    target: Table,
    id: i64,
) -> Result<(), StoreError> {
    if row_exists(conn, target, id)? {
        return Ok(());
    }
    Err(StoreError::ForeignKey {
        table,
        target,
        key: id.to_string(),
    })
}

/// Inserts or finds a class.
///
/// # Errors
///
/// Returns [`StoreError::Invariant`] when the stored size differs.
pub fn classify(
    conn: &Connection,
    repr: &CanonicalRepr,
    size: i64,
) -> Result<(GroupClassRecord, bool), StoreError> {
    if let Some(stored) = select_group_class(conn, repr).map_err(on(Table::GroupClass))? {
        validation::ensure_class_size_matches(&stored, size)?;
        return Ok((stored, false));
    }
    conn.execute(
        "INSERT INTO group_class (repr, size) VALUES (?1, ?2)",
        params![repr.as_str(), size],
    )
    .map_err(on(Table::GroupClass))?;
    let record = GroupClassRecord {
        id: GroupClassId::new(conn.last_insert_rowid()),
        repr: repr.clone(),
        size,
    };
    Ok((record, true))
}

/// Inserts or finds a group.
///
/// # Errors
///
/// Returns [`StoreError::ForeignKey`] for a missing class and
/// [`StoreError::Consistency`] when the stored class differs.
pub fn register_group(
    conn: &Connection,
    repr: &CanonicalRepr,
    class_id: GroupClassId,
) -> Result<(PermGroupRecord, bool), StoreError> {
    if let Some(stored) = select_perm_group(conn, repr).map_err(on(Table::PermGroup))? {
        validation::ensure_group_class_matches(&stored, class_id)?;
        return Ok((stored, false));
    }
    ensure_exists(conn, Table::PermGroup, Table::GroupClass, class_id.get())?;
    conn.execute(
        "INSERT INTO perm_group (repr, cls) VALUES (?1, ?2)",
        params![repr.as_str(), class_id.get()],
    )
    .map_err(on(Table::PermGroup))?;
    let record = PermGroupRecord {
        id: PermGroupId::new(conn.last_insert_rowid()),
        repr: repr.clone(),
        class_id,
    };
    Ok((record, true))
}

/// Inserts a membership pair if absent.
///
/// # Errors
///
/// Returns [`StoreError::ForeignKey`] when either side is missing.
pub fn attach_element(
    conn: &Connection,
    group_id: PermGroupId,
    permutation_id: PermutationId,
) -> Result<((), bool), StoreError> {
    ensure_exists(conn, Table::GroupElement, Table::PermGroup, group_id.get())?;
    ensure_exists(conn, Table::GroupElement, Table::Permutation, permutation_id.get())?;
    let inserted = conn
        .execute(
            "INSERT INTO group_element (grp, elt) VALUES (?1, ?2) ON CONFLICT (grp, elt) DO \
             NOTHING",
            params![group_id.get(), permutation_id.get()],
        )
        .map_err(on(Table::GroupElement))?;
    Ok(((), inserted == 1))
}

/// Lists the elements of a group in ascending order.
///
/// # Errors
///
/// Returns [`rusqlite::Error`] when the query fails.
pub fn select_group_elements(
    conn: &Connection,
    group_id: PermGroupId,
) -> rusqlite::Result<Vec<PermutationId>> {
    let mut stmt = conn.prepare("SELECT elt FROM group_element WHERE grp = ?1 ORDER BY elt")?;
    let rows = stmt.query_map(params![group_id.get()], |row| Ok(PermutationId::new(row.get(0)?)))?;
    rows.collect()
}

/// Lists the groups of a class in ascending id order.
///
/// # Errors
///
/// Returns [`rusqlite::Error`] when the query fails.
pub fn select_groups_in_class(
    conn: &Connection,
    class_id: GroupClassId,
) -> rusqlite::Result<Vec<PermGroupRecord>> {
    let mut stmt = conn.prepare("SELECT id, repr FROM perm_group WHERE cls = ?1 ORDER BY id")?;
    let rows = stmt.query_map(params![class_id.get()], |row| {
        Ok(PermGroupRecord {
            id: PermGroupId::new(row.get(0)?),
            repr: CanonicalRepr::new(row.get::<_, String>(1)?),
            class_id,
        })
    })?;
    rows.collect()
}

// ============================================================================
// SECTION: Histograms
// ============================================================================

/// Loads the size and bucket total of a class in one statement.
///
/// # Errors
///
/// Returns [`rusqlite::Error`] when the query fails.
pub fn select_conservation(
    conn: &Connection,
    class_id: GroupClassId,
) -> rusqlite::Result<Option<ConservationReport>> {
    conn.query_row(
        "SELECT size, (SELECT COALESCE(SUM(count), 0) FROM histogram WHERE id = ?1) FROM \
         group_class WHERE id = ?1",
        params![class_id.get()],
        |row| {
            Ok(ConservationReport {
                class_id,
                size: row.get(0)?,
                total: row.get(1)?,
            })
        },
    )
    .optional()
}

/// Loads the size and bucket total of an existing class.
fn conservation_for_write(
    conn: &Connection,
    class_id: GroupClassId,
) -> Result<ConservationReport, StoreError> {
    select_conservation(conn, class_id).map_err(on(Table::Histogram))?.ok_or_else(|| {
        StoreError::ForeignKey {
            table: Table::Histogram,
            target: Table::GroupClass,
            key: class_id.to_string(),
        }
    })
}

/// Counts one element of a class.
///
/// # Errors
///
/// Returns [`StoreError::ForeignKey`] for a missing class and
/// [`StoreError::Invariant`] when the class histogram is full.
pub fn record_element_decomp(
    conn: &Connection,
    class_id: GroupClassId,
    decomp: CycleDecomp,
) -> Result<((), bool), StoreError> {
    let report = conservation_for_write(conn, class_id)?;
    validation::ensure_histogram_open(class_id, report.size, report.total)?;
    let updated = conn
        .execute(
            "UPDATE histogram SET count = count + 1 WHERE id = ?1 AND decomp = ?2",
            params![class_id.get(), decomp.get()],
        )
        .map_err(on(Table::Histogram))?;
    if updated == 1 {
        return Ok(((), false));
    }
    conn.execute(
        "INSERT INTO histogram (id, decomp, count) VALUES (?1, ?2, 1)",
        params![class_id.get(), decomp.get()],
    )
    .map_err(on(Table::Histogram))?;
    Ok(((), true))
}

/// Writes every bucket of a class.
///
/// # Errors
///
/// Returns [`StoreError::ForeignKey`] for a missing class,
/// [`StoreError::Duplicate`] when buckets exist, and
/// [`StoreError::Invariant`] when the buckets do not match the size.
pub fn record_class_histogram(
    conn: &Connection,
    class_id: GroupClassId,
    buckets: &[HistogramBucket],
) -> Result<((), bool), StoreError> {
    let report = conservation_for_write(conn, class_id)?;
    if report.total > 0 {
        return Err(StoreError::Duplicate {
            table: Table::Histogram,
            key: class_id.to_string(),
        });
    }
    validation::validate_class_histogram(class_id, report.size, buckets)?;
    let mut stmt = conn
        .prepare("INSERT INTO histogram (id, decomp, count) VALUES (?1, ?2, ?3)")
        .map_err(on(Table::Histogram))?;
    for bucket in buckets {
        stmt.execute(params![class_id.get(), bucket.decomp.get(), bucket.count])
            .map_err(on(Table::Histogram))?;
    }
    Ok(((), true))
}

/// Lists the buckets of a class ordered by decomp.
///
/// # Errors
///
/// Returns [`rusqlite::Error`] when the query fails.
pub fn select_histogram(
    conn: &Connection,
    class_id: GroupClassId,
) -> rusqlite::Result<Vec<HistogramBucket>> {
    let mut stmt =
        conn.prepare("SELECT decomp, count FROM histogram WHERE id = ?1 ORDER BY decomp")?;
    let rows = stmt.query_map(params![class_id.get()], |row| {
        Ok(HistogramBucket {
            decomp: CycleDecomp::new(row.get(0)?),
            count: row.get(1)?,
        })
    })?;
    rows.collect()
}

// ============================================================================
// SECTION: Trials
// ============================================================================

/// Appends a trial.
///
/// # Errors
///
/// Returns [`StoreError::ForeignKey`] for a missing graph or group and
/// [`StoreError::Duplicate`] when the unique tuple exists.
pub fn record_trial(conn: &Connection, trial: &NewTrial) -> Result<(TrialId, bool), StoreError> {
    ensure_exists(conn, Table::Trial, Table::Graph, trial.graph_id.get())?;
    ensure_exists(conn, Table::Trial, Table::PermGroup, trial.group_id.get())?;
    let exists: bool = conn
        .query_row(
            "SELECT EXISTS (SELECT 1 FROM trial WHERE graph = ?1 AND nodes = ?2 AND method = ?3 \
             AND datetime = ?4)",
            params![
                trial.graph_id.get(),
                trial.nodes.get(),
                trial.method.as_str(),
                trial.datetime.as_unix_seconds()
            ],
            |row| row.get(0),
        )
        .map_err(on(Table::Trial))?;
    if exists {
        return Err(StoreError::Duplicate {
            table: Table::Trial,
            key: validation::trial_key(trial),
        });
    }
    conn.execute(
        "INSERT INTO trial (graph, nodes, method, grp, datetime) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            trial.graph_id.get(),
            trial.nodes.get(),
            trial.method.as_str(),
            trial.group_id.get(),
            trial.datetime.as_unix_seconds()
        ],
    )
    .map_err(on(Table::Trial))?;
    Ok((TrialId::new(conn.last_insert_rowid()), true))
}

/// Loads a trial by id.
///
/// # Errors
///
/// Returns [`rusqlite::Error`] when the query fails.
pub fn select_trial(conn: &Connection, id: TrialId) -> rusqlite::Result<Option<TrialRecord>> {
    conn.query_row(
        &format!("SELECT {TRIAL_COLUMNS} FROM trial WHERE id = ?1"),
        params![id.get()],
        trial_from_row,
    )
    .optional()
}

/// Lists trials with `start <= datetime < end`.
///
/// # Errors
///
/// Returns [`rusqlite::Error`] when the query fails.
pub fn select_trials_between(
    conn: &Connection,
    start: TrialTime,
    end: TrialTime,
) -> rusqlite::Result<Vec<TrialRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TRIAL_COLUMNS} FROM trial WHERE datetime >= ?1 AND datetime < ?2 ORDER BY \
         datetime, id"
    ))?;
    let rows = stmt.query_map(
        params![start.as_unix_seconds(), end.as_unix_seconds()],
        trial_from_row,
    )?;
    rows.collect()
}

/// Lists the trials of a graph.
///
/// # Errors
///
/// Returns [`rusqlite::Error`] when the query fails.
pub fn select_trials_for_graph(
    conn: &Connection,
    graph_id: GraphId,
) -> rusqlite::Result<Vec<TrialRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TRIAL_COLUMNS} FROM trial WHERE graph = ?1 ORDER BY datetime, id"
    ))?;
    let rows = stmt.query_map(params![graph_id.get()], trial_from_row)?;
    rows.collect()
}

// ============================================================================
// SECTION: Diagnostics
// ============================================================================

/// Counts rows in every table in one statement.
///
/// # Errors
///
/// Returns [`rusqlite::Error`] when the query fails.
pub fn select_counts(conn: &Connection) -> rusqlite::Result<StoreCounts> {
    conn.query_row(
        "SELECT (SELECT COUNT(*) FROM graph), (SELECT COUNT(*) FROM permutation), (SELECT \
         COUNT(*) FROM group_class), (SELECT COUNT(*) FROM perm_group), (SELECT COUNT(*) FROM \
         group_element), (SELECT COUNT(*) FROM histogram), (SELECT COUNT(*) FROM trial)",
        params![],
        |row| {
            Ok(StoreCounts {
                graphs: count(row.get(0)?),
                permutations: count(row.get(1)?),
                group_classes: count(row.get(2)?),
                perm_groups: count(row.get(3)?),
                group_elements: count(row.get(4)?),
                histogram_buckets: count(row.get(5)?),
                trials: count(row.get(6)?),
            })
        },
    )
}
