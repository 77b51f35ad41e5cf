// crates/traversal-group-core/src/core/canonical.rs
// ============================================================================
// Module: Canonical Representations
// Description: Canonical JSON keys for group classes and permutation groups.
// Purpose: Provide byte-stable string keys for repr-based deduplication.
// Dependencies: serde, serde_jcs, serde_json
// ============================================================================

//! ## Overview
//! Group classes and permutation groups are deduplicated by a canonical JSON
//! string. Callers normally pass the string produced by the external engine
//! verbatim via [`CanonicalRepr::new`]. [`CanonicalRepr::from_value`] is a
//! convenience that serializes any value with RFC 8785 (JCS) so that equal
//! values always produce byte-identical keys.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum accepted repr length in bytes.
pub const MAX_REPR_BYTES: usize = 1024 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when building a canonical representation.
#[derive(Debug, Error)]
pub enum CanonicalReprError {
    /// JSON canonicalization failed.
    #[error("failed to canonicalize json: {0}")]
    Canonicalization(String),
}

// ============================================================================
// SECTION: Canonical Repr
// ============================================================================

/// Canonical JSON string used as a unique key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalRepr(String);

impl CanonicalRepr {
    /// Wraps an externally produced canonical JSON string.
    #[must_use]
    pub fn new(repr: impl Into<String>) -> Self {
        Self(repr.into())
    }

    /// Serializes a value to RFC 8785 canonical JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CanonicalReprError::Canonicalization`] when serialization fails.
    pub fn from_value<T: Serialize + ?Sized>(value: &T) -> Result<Self, CanonicalReprError> {
        serde_jcs::to_string(value)
            .map(Self)
            .map_err(|err| CanonicalReprError::Canonicalization(err.to_string()))
    }

    /// Returns the repr as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the repr length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when the repr is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CanonicalRepr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for CanonicalRepr {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CanonicalRepr {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions are permitted.")]

    use serde_json::json;

    use super::CanonicalRepr;

    #[test]
    fn from_value_sorts_object_keys() {
        let left = CanonicalRepr::from_value(&json!({"b": 1, "a": [3, 1]})).unwrap();
        let right = CanonicalRepr::from_value(&json!({"a": [3, 1], "b": 1})).unwrap();
        assert_eq!(left, right);
        assert_eq!(left.as_str(), r#"{"a":[3,1],"b":1}"#);
    }

    #[test]
    fn from_value_has_no_insignificant_whitespace() {
        let repr = CanonicalRepr::from_value(&vec![vec![1, 2], vec![3]]).unwrap();
        assert_eq!(repr.as_str(), "[[1,2],[3]]");
    }
}
