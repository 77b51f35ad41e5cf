//! Config load validation tests for traversal-group-config.
// crates/traversal-group-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards (path, size, encoding, fields).
// Purpose: Ensure config input handling is strict and fail-closed.
// =============================================================================

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tempfile::TempDir;
use traversal_group_config::AuditSinkKind;
use traversal_group_config::ConfigError;
use traversal_group_config::TraversalConfig;
use traversal_group_core::CanonicalObjectStore;
use traversal_group_core::GraphId;
use traversal_group_core::GraphRecord;
use traversal_group_store_sqlite::SqliteSyncMode;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<TraversalConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config load".to_string()),
    }
}

fn write_config(content: &str) -> Result<NamedTempFile, String> {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(content.as_bytes()).map_err(|err| err.to_string())?;
    Ok(file)
}

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    let path = Path::new(&long_path);
    assert_invalid(TraversalConfig::load(Some(path)), "config path exceeds max length")
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    let path = Path::new(&long_component);
    assert_invalid(TraversalConfig::load(Some(path)), "config path component too long")
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    let payload = vec![b'#'; 1_048_577];
    file.write_all(&payload).map_err(|err| err.to_string())?;
    assert_invalid(TraversalConfig::load(Some(file.path())), "config file exceeds size limit")
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&[0xFF, 0xFE, 0xFF]).map_err(|err| err.to_string())?;
    assert_invalid(TraversalConfig::load(Some(file.path())), "config file must be utf-8")
}

#[test]
fn load_rejects_missing_file() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let result = TraversalConfig::load(Some(&dir.path().join("absent.toml")));
    match result {
        Err(ConfigError::Io(_)) => Ok(()),
        Err(other) => Err(format!("expected io error, got {other}")),
        Ok(_) => Err("expected missing file to fail".to_string()),
    }
}

#[test]
fn load_rejects_unknown_fields() -> TestResult {
    let file = write_config("[store]\npath = \"a.sqlite\"\ncache = 3\n")?;
    assert_invalid(TraversalConfig::load(Some(file.path())), "config parse error")
}

#[test]
fn load_applies_defaults() -> TestResult {
    let file = write_config("")?;
    let config = TraversalConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    if config != TraversalConfig::default() {
        return Err("defaults differ from TraversalConfig::default()".to_string());
    }
    Ok(())
}

#[test]
fn load_reads_all_sections() -> TestResult {
    let file = write_config(
        r#"
[store]
path = "data/traversal.sqlite"
busy_timeout_ms = 250
sync_mode = "normal"
read_pool_size = 2
lookup_cache_entries = 0

[retry]
max_attempts = 3
backoff_ms = 5

[audit]
sink = "stderr"
"#,
    )?;
    let config = TraversalConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    if config.store.busy_timeout_ms != 250
        || config.store.sync_mode != SqliteSyncMode::Normal
        || config.store.read_pool_size != 2
        || config.store.lookup_cache_entries != 0
        || config.retry.max_attempts != 3
        || config.retry.backoff_ms != 5
        || config.audit.sink != AuditSinkKind::Stderr
    {
        return Err("config sections were not applied".to_string());
    }
    Ok(())
}

#[test]
fn validate_rejects_zero_read_pool() -> TestResult {
    assert_invalid(
        TraversalConfig::from_toml("[store]\npath = \"a.sqlite\"\nread_pool_size = 0\n"),
        "read_pool_size",
    )
}

#[test]
fn validate_rejects_zero_attempts() -> TestResult {
    assert_invalid(TraversalConfig::from_toml("[retry]\nmax_attempts = 0\n"), "retry.max_attempts")
}

#[test]
fn validate_rejects_file_sink_without_path() -> TestResult {
    assert_invalid(TraversalConfig::from_toml("[audit]\nsink = \"file\"\n"), "requires audit.path")
}

#[test]
fn validate_rejects_path_without_file_sink() -> TestResult {
    assert_invalid(
        TraversalConfig::from_toml("[audit]\nsink = \"stderr\"\npath = \"audit.jsonl\"\n"),
        "requires audit.sink = file",
    )
}

#[test]
fn validate_rejects_empty_store_path() -> TestResult {
    assert_invalid(TraversalConfig::from_toml("[store]\npath = \" \"\n"), "store.path")
}

#[test]
fn open_store_uses_configured_sink() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let store_path = dir.path().join("store.sqlite");
    let audit_path = dir.path().join("audit.jsonl");
    let mut config = TraversalConfig::default();
    config.store.path = store_path;
    config.audit.sink = AuditSinkKind::File;
    config.audit.path = Some(audit_path.clone());

    let store = config.open_store().map_err(|err| err.to_string())?;
    let graph = GraphRecord {
        id: GraphId::new(42),
        nodes: 5,
        edges: 6,
    };
    store.intern_graph(&graph).map_err(|err| err.to_string())?;
    drop(store);

    let log = std::fs::read_to_string(&audit_path).map_err(|err| err.to_string())?;
    if log.lines().count() != 1 || !log.contains("\"intern_graph\"") {
        return Err(format!("unexpected audit log: {log}"));
    }
    Ok(())
}

#[test]
fn open_store_rejects_directory_path() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let mut config = TraversalConfig::default();
    config.store.path = dir.path().to_path_buf();
    match config.open_store() {
        Err(ConfigError::Store(_) | ConfigError::Invalid(_)) => Ok(()),
        Err(other) => Err(format!("unexpected error: {other}")),
        Ok(_) => Err("expected directory path to be rejected".to_string()),
    }
}
