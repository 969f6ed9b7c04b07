//! Per-attempt transaction context
//!
//! A `TransactionContext` lives for exactly one attempt of a unit of work.
//! Reads and writes go straight to the store; the context only remembers
//! the generation each read observed, so later writes to the same record
//! can require that generation.
//!
//! # Expected generation
//!
//! For a type with a generation field, a write requires:
//! 1. the generation captured by the latest read of that key in this attempt
//!    (a read that found nothing captures 0: the record must still be absent)
//! 2. otherwise the object's generation field, when non-zero
//! 3. otherwise nothing
//!
//! Types without a generation field write last-write-wins.
//!
//! Nothing carries over between attempts: every attempt gets a fresh
//! context and re-reads what it needs.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use recmap_core::{Generation, Key, Result, StoreClient, UserKey};
use recmap_mapper::{descriptor, Entity, EntityMapper, WriteSet};
use tracing::trace;

/// Operation context of one transaction attempt
pub struct TransactionContext<'a> {
    /// Transaction this attempt belongs to
    pub txn_id: u64,
    attempt: usize,
    store: &'a dyn StoreClient,
    mapper: &'a EntityMapper,
    default_namespace: &'a str,
    /// Generation observed per key (0 = the read found no record)
    read_set: HashMap<Key, Generation>,
    writes: usize,
    start_time: Instant,
}

impl<'a> TransactionContext<'a> {
    /// Create the context for one attempt
    ///
    /// # Arguments
    /// * `txn_id` - Transaction identifier, shared by all attempts
    /// * `attempt` - Zero-based attempt number
    /// * `store` - Store the attempt reads and writes
    /// * `mapper` - Mapper for object conversion
    /// * `default_namespace` - Namespace for types that don't pin one
    pub fn new(
        txn_id: u64,
        attempt: usize,
        store: &'a dyn StoreClient,
        mapper: &'a EntityMapper,
        default_namespace: &'a str,
    ) -> Self {
        Self {
            txn_id,
            attempt,
            store,
            mapper,
            default_namespace,
            read_set: HashMap::new(),
            writes: 0,
            start_time: Instant::now(),
        }
    }

    /// Zero-based attempt number
    pub fn attempt(&self) -> usize {
        self.attempt
    }

    /// Namespace used for types that don't pin one
    pub fn default_namespace(&self) -> &str {
        self.default_namespace
    }

    /// Generation this attempt last observed for `key`
    ///
    /// Only reads and writes of types with a generation field are tracked.
    /// `Some(Generation::ZERO)` means the record was absent.
    pub fn observed_generation(&self, key: &Key) -> Option<Generation> {
        self.read_set.get(key).copied()
    }

    /// Number of successful writes and deletes in this attempt
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Time since the attempt started
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Read and materialize a record
    ///
    /// # Errors
    ///
    /// Store failures, and `Mapping` if the record does not fit `T`.
    pub fn get<T: Entity>(&mut self, key: &Key) -> Result<Option<T>> {
        let desc = descriptor::<T>()?;
        let record = self.store.get(key)?;

        if desc.has_generation() {
            let generation = record
                .as_ref()
                .map(|r| r.generation)
                .unwrap_or(Generation::ZERO);
            trace!(target: "recmap::txn", txn_id = self.txn_id, %key, %generation, "Observed generation");
            self.read_set.insert(key.clone(), generation);
        }

        record
            .map(|record| self.mapper.materialize(&record))
            .transpose()
    }

    /// Read by user key, using the namespace and set of `T`
    ///
    /// # Errors
    ///
    /// Same as `get`.
    pub fn get_by<T: Entity>(&mut self, user_key: impl Into<UserKey>) -> Result<Option<T>> {
        let key = descriptor::<T>()?.key(user_key, self.default_namespace);
        self.get(&key)
    }

    /// Write an object under its own key
    ///
    /// A null key field gets a generated key first.
    ///
    /// # Errors
    ///
    /// Same as `put_at`.
    pub fn put<T: Entity>(&mut self, obj: &mut T) -> Result<Key> {
        let write_set = self.mapper.serialize(obj)?;
        let key = self.mapper.key_for(obj, self.default_namespace)?;
        self.write(&key, obj, &write_set)?;
        Ok(key)
    }

    /// Write an object under `key`
    ///
    /// On success the context and the object's generation field hold the
    /// new generation.
    ///
    /// # Errors
    ///
    /// - `Mapping` before any store call if the object cannot be serialized
    /// - `Conflict` if the record changed since it was observed
    /// - store failures
    pub fn put_at<T: Entity>(&mut self, key: &Key, obj: &mut T) -> Result<Generation> {
        let write_set = self.mapper.serialize(obj)?;
        self.write(key, obj, &write_set)
    }

    fn write<T: Entity>(
        &mut self,
        key: &Key,
        obj: &mut T,
        write_set: &WriteSet,
    ) -> Result<Generation> {
        let expected = match write_set.generation {
            Some(_) => self
                .observed_generation(key)
                .or_else(|| write_set.known_generation()),
            None => None,
        };
        let policy = write_set.write_policy().with_expected_generation(expected);

        let generation = self.store.put(key, &write_set.bins, &policy)?;
        self.writes += 1;

        if write_set.generation.is_some() {
            self.read_set.insert(key.clone(), generation);
            self.mapper.set_generation(obj, generation)?;
        }
        Ok(generation)
    }

    /// Delete a record
    ///
    /// Requires the generation observed for `key` in this attempt, if any.
    ///
    /// # Errors
    ///
    /// `Conflict` if the record changed since it was observed, or a store
    /// failure.
    pub fn delete(&mut self, key: &Key) -> Result<bool> {
        let expected = self.observed_generation(key);
        let removed = self.store.delete(key, expected)?;
        self.writes += 1;
        if expected.is_some() {
            self.read_set.insert(key.clone(), Generation::ZERO);
        }
        Ok(removed)
    }
}

impl std::fmt::Debug for TransactionContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionContext")
            .field("txn_id", &self.txn_id)
            .field("attempt", &self.attempt)
            .field("read_set", &self.read_set)
            .field("writes", &self.writes)
            .finish()
    }
}
