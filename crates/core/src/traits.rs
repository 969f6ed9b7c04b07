//! The store client abstraction
//!
//! The mapper and the transaction engine never speak the store's wire
//! protocol. They go through `StoreClient`, which exposes the four
//! primitives they need: read a record, write bins with an optional
//! generation precondition, delete with an optional generation precondition,
//! and look up a namespace's default TTL.
//!
//! Thread safety: all methods must be safe to call concurrently from multiple
//! threads (requires Send + Sync). The store is the only arbiter of
//! generation ordering; implementations must check the expected generation
//! and apply the write as one atomic step.

use crate::contract::Generation;
use crate::error::Result;
use crate::limits::TTL_NAMESPACE_DEFAULT;
use crate::record::{Bin, Record};
use crate::types::Key;

/// How a write treats an existing record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordExistsAction {
    /// Create the record or replace the existing one
    #[default]
    Update,
    /// Fail with `RecordExists` if the record exists
    CreateOnly,
    /// Fail if the record does not exist
    UpdateOnly,
}

/// Per-write options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritePolicy {
    /// Store-side TTL in seconds: -1 never, 0 namespace default, >0 relative seconds
    pub expiration: i64,
    /// Write only if the record is at this generation
    pub expected_generation: Option<Generation>,
    /// Existence precondition
    pub exists: RecordExistsAction,
}

impl Default for WritePolicy {
    fn default() -> Self {
        Self {
            expiration: TTL_NAMESPACE_DEFAULT,
            expected_generation: None,
            exists: RecordExistsAction::Update,
        }
    }
}

impl WritePolicy {
    /// Set the store-side TTL
    pub fn with_expiration(mut self, expiration: i64) -> Self {
        self.expiration = expiration;
        self
    }

    /// Require the record to be at `generation`
    pub fn with_expected_generation(mut self, generation: Option<Generation>) -> Self {
        self.expected_generation = generation;
        self
    }

    /// Set the existence precondition
    pub fn with_exists(mut self, exists: RecordExistsAction) -> Self {
        self.exists = exists;
        self
    }
}

/// Opaque store client
pub trait StoreClient: Send + Sync {
    /// Read a record
    ///
    /// Returns `None` if the record doesn't exist or has expired.
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails.
    fn get(&self, key: &Key) -> Result<Option<Record>>;

    /// Write bins to a record
    ///
    /// The bins replace the record's previous bins. Returns the generation
    /// the record has after the write.
    ///
    /// # Errors
    ///
    /// - `Conflict` if `policy.expected_generation` does not match
    /// - `RecordExists` for a `CreateOnly` write to an existing record
    /// - `InvalidTtl`, `NamespaceNotFound` or another store failure
    fn put(&self, key: &Key, bins: &[Bin], policy: &WritePolicy) -> Result<Generation>;

    /// Delete a record
    ///
    /// Returns whether a record was removed.
    ///
    /// # Errors
    ///
    /// - `Conflict` if `expected_generation` does not match
    /// - a store failure
    fn delete(&self, key: &Key, expected_generation: Option<Generation>) -> Result<bool>;

    /// Default TTL of a namespace in seconds (0 = records never expire)
    ///
    /// # Errors
    ///
    /// Returns `NamespaceNotFound` for unknown namespaces.
    fn namespace_default_ttl(&self, namespace: &str) -> Result<u32>;
}
