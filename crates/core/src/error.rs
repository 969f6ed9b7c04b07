//! Error types for recmap
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! # Categories
//!
//! | Category | Variants | Retried by `transact` |
//! |----------|----------|-----------------------|
//! | Mapping | `Mapping`, `Instantiation` | never |
//! | Concurrency | `Conflict` | yes, until the budget runs out |
//! | Concurrency | `ConcurrencyExhausted` | never (it is the outcome of retrying) |
//! | Precondition | `RecordExists` | never |
//! | Store | `Store`, `Io`, `Timeout`, `NamespaceNotFound`, `InvalidTtl` | never |
//! | Configuration | `Config` | never |

use std::io;
use std::time::Duration;
use thiserror::Error;

use crate::contract::Generation;
use crate::types::Key;

/// Result type alias for recmap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for recmap
#[derive(Debug, Error)]
pub enum Error {
    /// A type cannot be mapped, or a value does not fit its field
    #[error("mapping error for {type_name}{}: {reason}", bin_suffix(.bin))]
    Mapping {
        /// Name of the mapped type
        type_name: String,
        /// Bin involved, if the failure is specific to one bin
        bin: Option<String>,
        /// What went wrong
        reason: String,
    },

    /// A mapped type could not be constructed
    #[error("cannot instantiate {type_name}: {reason}")]
    Instantiation {
        /// Name of the mapped type
        type_name: String,
        /// What went wrong
        reason: String,
    },

    /// A write's expected generation did not match the record
    #[error("generation conflict on {key}: expected {expected}, found {actual}")]
    Conflict {
        /// Record the write targeted
        key: Key,
        /// Generation the write required
        expected: Generation,
        /// Generation the store holds
        actual: Generation,
    },

    /// `transact` ran out of retries while conflicts persisted
    #[error("concurrent modification persisted after {attempts} attempt(s){}", key_suffix(.key))]
    ConcurrencyExhausted {
        /// Number of times the unit of work ran
        attempts: usize,
        /// Record of the last conflict
        key: Option<Key>,
    },

    /// A create-only write found an existing record
    #[error("record already exists: {key}")]
    RecordExists {
        /// The existing record
        key: Key,
    },

    /// The namespace is not configured on the store
    #[error("namespace not found: {namespace}")]
    NamespaceNotFound {
        /// Requested namespace
        namespace: String,
    },

    /// The store refused a TTL
    #[error("invalid ttl {ttl}s (max {max}s)")]
    InvalidTtl {
        /// Requested TTL in seconds
        ttl: i64,
        /// Largest TTL the namespace accepts
        max: i64,
    },

    /// The store call exceeded its deadline
    #[error("{operation} timed out after {elapsed:?}")]
    Timeout {
        /// Store operation that timed out
        operation: &'static str,
        /// Time spent before giving up
        elapsed: Duration,
    },

    /// Store-side failure
    #[error("store error: {message}")]
    Store {
        /// Error message
        message: String,
    },

    /// I/O error (network, files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid configuration
    #[error("configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },
}

fn bin_suffix(bin: &Option<String>) -> String {
    bin.as_ref()
        .map(|b| format!(" (bin '{}')", b))
        .unwrap_or_default()
}

fn key_suffix(key: &Option<Key>) -> String {
    key.as_ref().map(|k| format!(" on {}", k)).unwrap_or_default()
}

impl Error {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Mapping error not tied to a particular bin
    pub fn mapping(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Mapping {
            type_name: type_name.into(),
            bin: None,
            reason: reason.into(),
        }
    }

    /// Mapping error for one bin
    pub fn mapping_bin(
        type_name: impl Into<String>,
        bin: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Error::Mapping {
            type_name: type_name.into(),
            bin: Some(bin.into()),
            reason: reason.into(),
        }
    }

    /// Instantiation error
    pub fn instantiation(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Instantiation {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// Generic store failure
    pub fn store(message: impl Into<String>) -> Self {
        Error::Store {
            message: message.into(),
        }
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    // =========================================================================
    // Classification
    // =========================================================================

    /// Generation mismatch (the only error `transact` retries)
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }

    /// Schema or construction problem (a programming error)
    pub fn is_mapping(&self) -> bool {
        matches!(self, Error::Mapping { .. } | Error::Instantiation { .. })
    }

    /// Failure reported by or on the way to the store
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            Error::Store { .. }
                | Error::Io(_)
                | Error::Timeout { .. }
                | Error::NamespaceNotFound { .. }
                | Error::InvalidTtl { .. }
        )
    }
}
