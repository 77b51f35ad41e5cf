// crates/traversal-group-core/src/core/identifiers.rs
// ============================================================================
// Module: Traversal Group Identifiers
// Description: Strongly typed integer keys and short string tags.
// Purpose: Keep canonical encodings and surrogate ids from being mixed up.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every key in the store is an `i64`, either a canonical encoding computed by
//! the external engine (graphs, permutations, cycle types, node subsets) or a
//! surrogate allocated by the store (classes, groups, trials). The wrappers
//! here are transparent on the wire and carry no validation; range checks live
//! in [`crate::core::validation`] at the store boundary.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Integer Keys
// ============================================================================

/// Declares a transparent `i64` key wrapper.
macro_rules! integer_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw integer value.
            #[must_use]
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw integer value.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

integer_key!(
    /// Canonical integer encoding of a graph (edge bitmask over the complete graph).
    GraphId
);

integer_key!(
    /// Canonical integer encoding of a permutation.
    PermutationId
);

integer_key!(
    /// Encoded cycle type of a permutation.
    ///
    /// # Invariants
    /// - Valid encodings are strictly positive.
    CycleDecomp
);

integer_key!(
    /// Encoded subset of a graph's nodes used as traversal starting points.
    NodeSubset
);

integer_key!(
    /// Surrogate identifier of a group class.
    GroupClassId
);

integer_key!(
    /// Surrogate identifier of a concrete permutation group.
    PermGroupId
);

integer_key!(
    /// Surrogate identifier of a trial.
    TrialId
);

// ============================================================================
// SECTION: Method Tag
// ============================================================================

/// Short tag naming the traversal method a trial ran (for example `bfs`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MethodTag(String);

impl MethodTag {
    /// Creates a new method tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Returns the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MethodTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for MethodTag {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for MethodTag {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
