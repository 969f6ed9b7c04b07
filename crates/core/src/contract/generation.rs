//! Record generation counter
//!
//! The store maintains a generation per record and bumps it on every
//! successful write. A write may carry an expected generation; the store
//! rejects it atomically if the record has moved on. This is the whole of
//! the optimistic concurrency protocol.
//!
//! A record that does not exist is at generation 0. New records start at 1.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned record version
///
/// ## Invariants
///
/// - Generations increase by exactly one per successful write
/// - `Generation::ZERO` means "no record"
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Generation(u32);

impl Generation {
    /// Generation of a record that does not exist
    pub const ZERO: Generation = Generation(0);

    /// Create a generation from its raw value
    #[inline]
    pub const fn new(value: u32) -> Self {
        Generation(value)
    }

    /// Get the raw value
    #[inline]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// Check if this is the "no record" generation
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// The generation a record has after one more write
    ///
    /// Wraps past `u32::MAX` back to 1, never to 0.
    pub const fn next(&self) -> Self {
        match self.0.checked_add(1) {
            Some(v) => Generation(v),
            None => Generation(1),
        }
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Generation {
    fn from(value: u32) -> Self {
        Generation(value)
    }
}

impl From<Generation> for u32 {
    fn from(g: Generation) -> Self {
        g.0
    }
}
