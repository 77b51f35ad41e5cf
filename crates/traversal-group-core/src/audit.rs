// crates/traversal-group-core/src/audit.rs
// ============================================================================
// Module: Store Audit Logging
// Description: Structured audit events for traversal store writes.
// Purpose: Emit one JSON line per write without a hard logging dependency.
// Dependencies: crate::interfaces, serde, serde_json
// ============================================================================

//! ## Overview
//! Every write operation on a store backend emits a [`StoreAuditEvent`]
//! describing what was attempted, against which key, and how it ended. Sinks
//! decide where the JSON lines go; the default sink drops them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::interfaces::StoreError;
use crate::interfaces::Table;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Write operations reported to audit sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreOperation {
    /// `intern_graph`.
    InternGraph,
    /// `intern_permutation`.
    InternPermutation,
    /// `classify_or_get`.
    ClassifyGroup,
    /// `register_group_or_get`.
    RegisterGroup,
    /// `attach_element`.
    AttachElement,
    /// `record_element_decomp`.
    RecordElementDecomp,
    /// `record_class_histogram`.
    RecordClassHistogram,
    /// `record_trial`.
    RecordTrial,
}

impl StoreOperation {
    /// Returns the stable operation label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InternGraph => "intern_graph",
            Self::InternPermutation => "intern_permutation",
            Self::ClassifyGroup => "classify_group",
            Self::RegisterGroup => "register_group",
            Self::AttachElement => "attach_element",
            Self::RecordElementDecomp => "record_element_decomp",
            Self::RecordClassHistogram => "record_class_histogram",
            Self::RecordTrial => "record_trial",
        }
    }
}

/// How a write ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// A new row was inserted.
    Created,
    /// The row already existed and was returned unchanged.
    Existing,
    /// The write failed with a store error.
    Rejected,
    /// The write hit contention and will be attempted again.
    Retried,
}

impl AuditOutcome {
    /// Maps an insert flag to an outcome.
    #[must_use]
    pub const fn from_created(created: bool) -> Self {
        if created { Self::Created } else { Self::Existing }
    }
}

/// Store write audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct StoreAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Write operation.
    pub operation: StoreOperation,
    /// Table targeted by the write.
    pub table: Table,
    /// Rendered key of the written row.
    pub key: String,
    /// Write outcome.
    pub outcome: AuditOutcome,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// One-based attempt number.
    pub attempt: u32,
}

/// Inputs required to construct a store audit event.
pub struct StoreAuditEventParams {
    /// Write operation.
    pub operation: StoreOperation,
    /// Table targeted by the write.
    pub table: Table,
    /// Rendered key of the written row.
    pub key: String,
    /// Write outcome.
    pub outcome: AuditOutcome,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// One-based attempt number.
    pub attempt: u32,
}

impl StoreAuditEvent {
    /// Creates a new audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: StoreAuditEventParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "store_write",
            timestamp_ms,
            operation: params.operation,
            table: params.table,
            key: params.key,
            outcome: params.outcome,
            error_kind: params.error_kind,
            attempt: params.attempt,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for store write events.
pub trait StoreAuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &StoreAuditEvent);
}

/// Records the outcome of one write attempt. A retryable failure is reported
/// as [`AuditOutcome::Retried`] unless `attempt` is the last one allowed.
pub fn record_write<T>(
    sink: &dyn StoreAuditSink,
    operation: StoreOperation,
    table: Table,
    key: String,
    result: &Result<(T, bool), StoreError>,
    attempt: u32,
    max_attempts: u32,
) {
    let (outcome, error_kind) = match result {
        Ok((_, created)) => (AuditOutcome::from_created(*created), None),
        Err(err) if err.is_retryable() && attempt < max_attempts => {
            (AuditOutcome::Retried, Some(err.kind()))
        }
        Err(err) => (AuditOutcome::Rejected, Some(err.kind())),
    };
    sink.record(&StoreAuditEvent::new(StoreAuditEventParams {
        operation,
        table,
        key,
        outcome,
        error_kind,
        attempt,
    }));
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl StoreAuditSink for StderrAuditSink {
    fn record(&self, event: &StoreAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl StoreAuditSink for FileAuditSink {
    fn record(&self, event: &StoreAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl StoreAuditSink for NoopAuditSink {
    fn record(&self, _event: &StoreAuditEvent) {}
}
