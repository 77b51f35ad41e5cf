// crates/traversal-group-core/src/core/time.rs
// ============================================================================
// Module: Trial Time Model
// Description: Wall-clock instants attached to trial records.
// Purpose: Carry caller-supplied trial timestamps with a stable wire form.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Trials are stamped with fractional unix seconds, the resolution the
//! experiment driver records. The store never reads the clock itself; callers
//! supply the instant, which also makes the duplicate-trial check
//! deterministic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Trial Time
// ============================================================================

/// Unix time in fractional seconds at which a trial ran.
///
/// # Invariants
/// - Only finite values are accepted by stores; see [`TrialTime::is_finite`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrialTime(f64);

impl TrialTime {
    /// Creates a trial time from fractional unix seconds.
    #[must_use]
    pub const fn from_unix_seconds(seconds: f64) -> Self {
        Self(seconds)
    }

    /// Returns the time as fractional unix seconds.
    #[must_use]
    pub const fn as_unix_seconds(self) -> f64 {
        self.0
    }

    /// Returns true when the value is neither NaN nor infinite.
    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}

impl fmt::Display for TrialTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
