// crates/traversal-group-core/src/runtime/retry.rs
// ============================================================================
// Module: Transient Retry Policy
// Description: Bounded retry loop for contended store writes.
// Purpose: Re-run idempotent writes when the backend reports contention.
// Dependencies: crate::interfaces, serde
// ============================================================================

//! ## Overview
//! Only [`StoreError::Transient`] failures are retried. Every other error is
//! returned on the attempt that produced it. Delays grow linearly with the
//! attempt number.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::thread;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Default number of attempts per write.
const fn default_max_attempts() -> u32 {
    5
}

/// Default delay unit between attempts in milliseconds.
const fn default_backoff_ms() -> u64 {
    10
}

/// Retry configuration for idempotent writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryPolicy {
    /// Total attempts including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay unit; attempt `n` waits `n * backoff_ms` before attempt `n + 1`.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl RetryPolicy {
    /// Returns a policy that runs each write exactly once.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            backoff_ms: 0,
        }
    }

    /// Runs `operation` until it succeeds, fails permanently, or the attempt
    /// budget is spent. The closure receives the one-based attempt number.
    ///
    /// # Errors
    ///
    /// Returns the last error produced by `operation`.
    pub fn run<T>(
        &self,
        mut operation: impl FnMut(u32) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match operation(attempt) {
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    let delay = self.backoff_ms.saturating_mul(u64::from(attempt));
                    if delay > 0 {
                        thread::sleep(Duration::from_millis(delay));
                    }
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
