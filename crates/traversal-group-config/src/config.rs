// crates/traversal-group-config/src/config.rs
// ============================================================================
// Module: Traversal Group Configuration
// Description: Configuration loading and validation for the traversal store.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: traversal-group-core, traversal-group-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Unknown keys, missing paths, and out-of-range values fail closed before any
//! store is opened.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use traversal_group_core::FileAuditSink;
use traversal_group_core::NoopAuditSink;
use traversal_group_core::RetryPolicy;
use traversal_group_core::StderrAuditSink;
use traversal_group_core::StoreAuditSink;
use traversal_group_store_sqlite::SqliteStoreConfig;
use traversal_group_store_sqlite::SqliteStoreError;
use traversal_group_store_sqlite::SqliteTraversalStore;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "traversal-group.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "TRAVERSAL_GROUP_CONFIG";
/// Default database filename when `[store]` is omitted.
const DEFAULT_STORE_PATH: &str = "traversal-group.sqlite";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Upper bound on attempts per write.
pub const MAX_RETRY_ATTEMPTS: u32 = 100;
/// Upper bound on the retry delay unit in milliseconds.
pub const MAX_BACKOFF_MS: u64 = 10_000;

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Top-level traversal group configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TraversalConfig {
    /// `SQLite` store settings.
    #[serde(default = "default_store")]
    pub store: SqliteStoreConfig,
    /// Retry policy for contended writes.
    #[serde(default)]
    pub retry: RetryPolicy,
    /// Audit sink settings.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            store: default_store(),
            retry: RetryPolicy::default(),
            audit: AuditConfig::default(),
        }
    }
}

/// Returns the store settings used when `[store]` is omitted.
fn default_store() -> SqliteStoreConfig {
    SqliteStoreConfig::new(DEFAULT_STORE_PATH)
}

impl TraversalConfig {
    /// Loads configuration from disk using the default resolution rules:
    /// the explicit path, then [`CONFIG_ENV_VAR`], then `traversal-group.toml`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] when validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        if content.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("store.path", &self.store.path.to_string_lossy())?;
        self.store.validate().map_err(|err| ConfigError::Invalid(err.to_string()))?;
        validate_retry(&self.retry)?;
        self.audit.validate()
    }

    /// Builds the configured audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the audit file cannot be opened.
    pub fn build_sink(&self) -> Result<Arc<dyn StoreAuditSink>, ConfigError> {
        self.audit.build_sink()
    }

    /// Opens the configured `SQLite` store with its retry policy and audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when validation fails or the store cannot open.
    pub fn open_store(&self) -> Result<SqliteTraversalStore, ConfigError> {
        self.validate()?;
        let sink = self.build_sink()?;
        let store = SqliteTraversalStore::new(self.store.clone())?;
        Ok(store.with_retry_policy(self.retry).with_audit_sink(sink))
    }
}

/// Audit sink configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Sink kind.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// JSON lines path when `sink = "file"`.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl AuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkKind::File, Some(path)) => {
                validate_path_string("audit.path", &path.to_string_lossy())
            }
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("audit.sink = file requires audit.path".to_string()))
            }
            (_, Some(_)) => {
                Err(ConfigError::Invalid("audit.path requires audit.sink = file".to_string()))
            }
            (_, None) => Ok(()),
        }
    }

    /// Builds the sink this configuration names.
    fn build_sink(&self) -> Result<Arc<dyn StoreAuditSink>, ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkKind::None, _) => Ok(Arc::new(NoopAuditSink)),
            (AuditSinkKind::Stderr, _) => Ok(Arc::new(StderrAuditSink)),
            (AuditSinkKind::File, Some(path)) => {
                let sink = FileAuditSink::new(path)
                    .map_err(|err| ConfigError::Io(format!("audit.path: {err}")))?;
                Ok(Arc::new(sink))
            }
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("audit.sink = file requires audit.path".to_string()))
            }
        }
    }
}

/// Audit sink kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// Discard audit events.
    #[default]
    None,
    /// JSON lines on stderr.
    Stderr,
    /// JSON lines appended to `audit.path`.
    File,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
    /// The configured store failed to open.
    #[error("config store error: {0}")]
    Store(#[from] SqliteStoreError),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the caller or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates retry bounds.
fn validate_retry(retry: &RetryPolicy) -> Result<(), ConfigError> {
    if retry.max_attempts == 0 || retry.max_attempts > MAX_RETRY_ATTEMPTS {
        return Err(ConfigError::Invalid(format!(
            "retry.max_attempts must be in 1..={MAX_RETRY_ATTEMPTS}"
        )));
    }
    if retry.backoff_ms > MAX_BACKOFF_MS {
        return Err(ConfigError::Invalid(format!("retry.backoff_ms exceeds {MAX_BACKOFF_MS}")));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions are permitted."
    )]

    use super::*;

    #[test]
    fn validate_path_string_rejects_whitespace_only() {
        assert!(matches!(validate_path_string("store.path", "   "), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn validate_path_string_error_includes_field_name() {
        let long = "a".repeat(MAX_PATH_COMPONENT_LENGTH + 1);
        let err = validate_path_string("audit.path", &long).unwrap_err();
        assert!(err.to_string().contains("audit.path"));
    }

    #[test]
    fn validate_retry_bounds() {
        assert!(validate_retry(&RetryPolicy::no_retry()).is_ok());
        let zero = RetryPolicy {
            max_attempts: 0,
            backoff_ms: 0,
        };
        assert!(validate_retry(&zero).is_err());
        let slow = RetryPolicy {
            max_attempts: 2,
            backoff_ms: MAX_BACKOFF_MS + 1,
        };
        assert!(validate_retry(&slow).is_err());
    }

    #[test]
    fn resolve_path_prefers_explicit_path() {
        let resolved = resolve_path(Some(Path::new("custom.toml"))).unwrap();
        assert_eq!(resolved, PathBuf::from("custom.toml"));
    }
}
