//! Session: the entry point for mapped reads and writes
//!
//! A `Session` binds a store to a mapper and a transaction manager and
//! offers whole-object operations:
//!
//! | Operation | Store write | Precondition |
//! |-----------|-------------|--------------|
//! | `insert` | create-only | record must not exist |
//! | `update` | upsert | object's generation, when non-zero |
//! | `delete` | delete | object's generation, when non-zero |
//! | `delete_key` | delete | none |
//! | `transact` | per unit of work | generations observed in the attempt |
//!
//! Every operation serializes (or validates) the object before talking to
//! the store, so mapping errors never leave partial effects behind.

mod builder;
pub mod config;

pub use builder::SessionBuilder;
pub use config::{SessionConfig, CONFIG_FILE_NAME};

use std::sync::Arc;

use recmap_concurrency::{TransactionContext, TransactionManager, TransactionMetrics};
use recmap_core::{
    Error, Generation, Key, RecordExistsAction, Result, StoreClient, UserKey, WritePolicy,
};
use recmap_mapper::{descriptor, Entity, EntityMapper, WriteSet};
use tracing::debug;

/// Mapped access to one store
pub struct Session {
    store: Arc<dyn StoreClient>,
    mapper: EntityMapper,
    config: SessionConfig,
    transactions: TransactionManager,
}

impl Session {
    /// Start building a session on `store`
    pub fn builder(store: Arc<dyn StoreClient>) -> SessionBuilder {
        SessionBuilder::new(store)
    }

    /// Configuration in use
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Mapper in use
    pub fn mapper(&self) -> &EntityMapper {
        &self.mapper
    }

    /// Store in use
    pub fn store(&self) -> &Arc<dyn StoreClient> {
        &self.store
    }

    /// Namespace for types that don't pin one
    pub fn default_namespace(&self) -> &str {
        &self.config.default_namespace
    }

    /// Key of a `T` record with the given user key
    ///
    /// # Errors
    ///
    /// Returns `Mapping` if `T` cannot be mapped.
    pub fn key<T: Entity>(&self, user_key: impl Into<UserKey>) -> Result<Key> {
        Ok(descriptor::<T>()?.key(user_key, self.default_namespace()))
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Load the record at `key` as a `T`
    ///
    /// # Errors
    ///
    /// Store failures, and `Mapping` if the record does not fit `T`.
    pub fn load<T: Entity>(&self, key: &Key) -> Result<Option<T>> {
        descriptor::<T>()?;
        self.store
            .get(key)?
            .map(|record| self.mapper.materialize(&record))
            .transpose()
    }

    /// Load a `T` by user key
    ///
    /// # Errors
    ///
    /// Same as `load`.
    pub fn load_by<T: Entity>(&self, user_key: impl Into<UserKey>) -> Result<Option<T>> {
        let key = self.key::<T>(user_key)?;
        self.load(&key)
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Create a record from `obj`
    ///
    /// A null key field gets a generated key first; the key is returned.
    ///
    /// # Errors
    ///
    /// - `Mapping` before any store call
    /// - `RecordExists` if a record already has the key
    /// - store failures
    pub fn insert<T: Entity>(&self, obj: &mut T) -> Result<Key> {
        let write_set = self.mapper.serialize(obj)?;
        let key = self.mapper.key_for(obj, self.default_namespace())?;
        self.write(&key, obj, &write_set, &create_policy(&write_set))?;
        Ok(key)
    }

    /// Create the record at `key` from `obj`
    ///
    /// # Errors
    ///
    /// Same as `insert`.
    pub fn insert_at<T: Entity>(&self, key: &Key, obj: &mut T) -> Result<Generation> {
        let write_set = self.mapper.serialize(obj)?;
        self.write(key, obj, &write_set, &create_policy(&write_set))
    }

    /// Write `obj` under its own key, creating or replacing the record
    ///
    /// # Errors
    ///
    /// Same as `update_at`.
    pub fn update<T: Entity>(&self, obj: &mut T) -> Result<Key> {
        let write_set = self.mapper.serialize(obj)?;
        let key = self.mapper.key_for(obj, self.default_namespace())?;
        self.write(&key, obj, &write_set, &replace_policy(&write_set))?;
        Ok(key)
    }

    /// Write `obj` at `key`, creating or replacing the record
    ///
    /// An object carrying a non-zero generation only overwrites that
    /// generation of the record.
    ///
    /// # Errors
    ///
    /// - `Mapping` before any store call
    /// - `Conflict` if the record moved past the object's generation
    /// - store failures
    pub fn update_at<T: Entity>(&self, key: &Key, obj: &mut T) -> Result<Generation> {
        let write_set = self.mapper.serialize(obj)?;
        self.write(key, obj, &write_set, &replace_policy(&write_set))
    }

    fn write<T: Entity>(
        &self,
        key: &Key,
        obj: &mut T,
        write_set: &WriteSet,
        policy: &WritePolicy,
    ) -> Result<Generation> {
        let generation = self.store.put(key, &write_set.bins, policy)?;
        debug!(target: "recmap::session", %key, %generation, exists = ?policy.exists, "Record written");
        self.mapper.set_generation(obj, generation)?;
        Ok(generation)
    }

    /// Delete the record of `obj`
    ///
    /// # Errors
    ///
    /// - `Mapping` if `obj` has no key
    /// - `Conflict` if the record moved past the object's generation
    /// - store failures
    pub fn delete<T: Entity>(&self, obj: &T) -> Result<bool> {
        let key = self
            .mapper
            .key_of(obj, self.default_namespace())?
            .ok_or_else(|| {
                Error::mapping(
                    std::any::type_name::<T>(),
                    "object has no key to delete by",
                )
            })?;
        let expected = self.mapper.generation_of(obj)?.filter(|g| !g.is_zero());
        self.store.delete(&key, expected)
    }

    /// Delete the record at `key` unconditionally
    ///
    /// # Errors
    ///
    /// Store failures.
    pub fn delete_key(&self, key: &Key) -> Result<bool> {
        self.store.delete(key, None)
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Run `work` with up to `max_retries` retries on generation conflicts
    ///
    /// # Errors
    ///
    /// `ConcurrencyExhausted` when every attempt conflicted; any other error
    /// from `work` or the store unretried.
    pub fn transact<R, F>(&self, max_retries: usize, work: F) -> Result<R>
    where
        F: Fn(&mut TransactionContext<'_>) -> Result<R>,
    {
        self.transactions.transact(max_retries, work)
    }

    /// Run `work` with the configured retry budget
    ///
    /// # Errors
    ///
    /// Same as `transact`.
    pub fn transact_default<R, F>(&self, work: F) -> Result<R>
    where
        F: Fn(&mut TransactionContext<'_>) -> Result<R>,
    {
        self.transactions.transact_default(work)
    }

    /// Transaction statistics
    pub fn metrics(&self) -> TransactionMetrics {
        self.transactions.metrics()
    }

    /// Default TTL of `namespace` in seconds (0 = never expires)
    ///
    /// # Errors
    ///
    /// `NamespaceNotFound` for unknown namespaces.
    pub fn namespace_default_ttl(&self, namespace: &str) -> Result<u32> {
        self.store.namespace_default_ttl(namespace)
    }
}

fn create_policy(write_set: &WriteSet) -> WritePolicy {
    write_set
        .write_policy()
        .with_exists(RecordExistsAction::CreateOnly)
}

fn replace_policy(write_set: &WriteSet) -> WritePolicy {
    write_set
        .write_policy()
        .with_expected_generation(write_set.known_generation())
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("metrics", &self.metrics())
            .finish()
    }
}
