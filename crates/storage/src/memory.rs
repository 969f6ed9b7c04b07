//! In-process store
//!
//! `MemoryStore` implements `StoreClient` with the record semantics the
//! mapper and transaction engine rely on: namespaces with their own TTL
//! policy, per-record generation counters, generation-checked writes and
//! void-time expiration.
//!
//! # Design
//!
//! - DashMap: one shard per namespace, sharded by default
//! - FxHashMap: O(1) lookups of (set, user key) within a namespace
//! - Every mutation of a namespace happens under its shard entry lock, so
//!   the generation check and the write it guards are one atomic step
//!
//! # Expiration
//!
//! Expired records are hidden from `get` as soon as their void time has
//! passed. `evict_expired` removes them physically using the `TtlIndex`.

use dashmap::DashMap;
use recmap_core::limits::{
    unix_millis_to_void_time, unix_secs_to_void_time, DEFAULT_MAX_TTL_SECS,
    TTL_NAMESPACE_DEFAULT, TTL_NEVER_EXPIRE,
};
use recmap_core::{
    Bin, Clock, Error, Generation, Key, Record, RecordExistsAction, Result, StoreClient,
    SystemClock, Timestamp, Value, WritePolicy,
};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::stored_record::{RecordId, StoredRecord};
use crate::ttl::TtlIndex;

/// Store-side policy of one namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceConfig {
    /// TTL applied to writes that ask for the namespace default (0 = never expire)
    pub default_ttl_secs: u32,
    /// Largest TTL a write may request
    pub max_ttl_secs: i64,
}

impl Default for NamespaceConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: 0,
            max_ttl_secs: DEFAULT_MAX_TTL_SECS,
        }
    }
}

impl NamespaceConfig {
    /// Namespace config with the given default TTL
    pub fn with_default_ttl(default_ttl_secs: u32) -> Self {
        Self {
            default_ttl_secs,
            ..Self::default()
        }
    }

    /// Resolve a write's expiration into a void time
    ///
    /// # Errors
    ///
    /// `InvalidTtl` when the TTL is below -1 or above the namespace maximum.
    fn void_time_for(&self, expiration: i64, now: Timestamp) -> Result<u32> {
        let ttl = match expiration {
            TTL_NEVER_EXPIRE => return Ok(0),
            TTL_NAMESPACE_DEFAULT if self.default_ttl_secs == 0 => return Ok(0),
            TTL_NAMESPACE_DEFAULT => i64::from(self.default_ttl_secs),
            ttl if ttl < TTL_NEVER_EXPIRE || ttl > self.max_ttl_secs => {
                return Err(Error::InvalidTtl {
                    ttl,
                    max: self.max_ttl_secs,
                })
            }
            ttl => ttl,
        };
        // Void time 0 means "never", so a live record always lands on at least 1
        let expires_ms = now.as_millis().saturating_add(ttl.saturating_mul(1_000));
        Ok(unix_millis_to_void_time(expires_ms).max(1))
    }
}

/// Records of one namespace
#[derive(Debug, Default)]
pub struct NamespaceShard {
    config: NamespaceConfig,
    data: FxHashMap<RecordId, StoredRecord>,
    ttl_index: TtlIndex,
}

impl NamespaceShard {
    fn new(config: NamespaceConfig) -> Self {
        Self {
            config,
            data: FxHashMap::default(),
            ttl_index: TtlIndex::new(),
        }
    }

    /// Live record for `id` at `now`
    fn live(&self, id: &RecordId, now: Timestamp) -> Option<&StoredRecord> {
        self.data.get(id).filter(|r| !r.is_expired(now))
    }

    fn remove(&mut self, id: &RecordId) -> Option<StoredRecord> {
        let removed = self.data.remove(id)?;
        self.ttl_index.remove(removed.void_time(), id);
        Some(removed)
    }

    fn evict_expired(&mut self, now_void: u32) -> usize {
        let expired = self.ttl_index.find_expired(now_void);
        let mut count = 0;
        for id in &expired {
            if self.data.remove(id).is_some() {
                count += 1;
            }
        }
        self.ttl_index.remove_expired(now_void);
        count
    }

    /// Number of records held, including expired ones not yet evicted
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the shard holds no records
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// In-process `StoreClient`
pub struct MemoryStore {
    namespaces: DashMap<String, NamespaceShard>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    /// Store with a single `test` namespace (no default TTL) and the system clock
    pub fn new() -> Self {
        Self::builder()
            .namespace("test", NamespaceConfig::default())
            .build()
    }

    /// Start building a store
    pub fn builder() -> MemoryStoreBuilder {
        MemoryStoreBuilder::default()
    }

    /// Clock the store resolves TTLs against
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Register (or reconfigure) a namespace
    pub fn add_namespace(&self, name: impl Into<String>, config: NamespaceConfig) {
        let name = name.into();
        debug!(target: "recmap::store", namespace = %name, default_ttl = config.default_ttl_secs, "Registering namespace");
        self.namespaces
            .entry(name)
            .and_modify(|shard| shard.config = config)
            .or_insert_with(|| NamespaceShard::new(config));
    }

    /// Check whether a namespace exists
    pub fn has_namespace(&self, name: &str) -> bool {
        self.namespaces.contains_key(name)
    }

    /// Remove every record whose void time is at or before `now`
    ///
    /// Returns the number of records removed.
    pub fn evict_expired(&self, now: Timestamp) -> usize {
        let now_void = unix_secs_to_void_time(now.as_secs());
        let mut total = 0;
        for mut shard in self.namespaces.iter_mut() {
            total += shard.evict_expired(now_void);
        }
        if total > 0 {
            info!(target: "recmap::store", evicted = total, "Evicted expired records");
        }
        total
    }

    /// Number of records held across namespaces, including expired ones not yet evicted
    pub fn len(&self) -> usize {
        self.namespaces.iter().map(|shard| shard.len()).sum()
    }

    /// Check if the store holds no records
    pub fn is_empty(&self) -> bool {
        self.namespaces.iter().all(|shard| shard.is_empty())
    }

    fn not_found(namespace: &str) -> Error {
        Error::NamespaceNotFound {
            namespace: namespace.to_string(),
        }
    }

    fn record_id(key: &Key) -> RecordId {
        (key.set_name.clone(), key.user_key.clone())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("namespaces", &self.namespaces.len())
            .field("records", &self.len())
            .finish()
    }
}

impl StoreClient for MemoryStore {
    fn get(&self, key: &Key) -> Result<Option<Record>> {
        let now = self.clock.now();
        let shard = self
            .namespaces
            .get(&key.namespace)
            .ok_or_else(|| Self::not_found(&key.namespace))?;
        Ok(shard
            .live(&Self::record_id(key), now)
            .map(|stored| stored.to_record(key)))
    }

    fn put(&self, key: &Key, bins: &[Bin], policy: &WritePolicy) -> Result<Generation> {
        let now = self.clock.now();
        let mut entry = self
            .namespaces
            .get_mut(&key.namespace)
            .ok_or_else(|| Self::not_found(&key.namespace))?;
        let shard = &mut *entry;

        let void_time = shard.config.void_time_for(policy.expiration, now)?;
        let id = Self::record_id(key);
        let current = shard.live(&id, now).map(StoredRecord::generation);
        let actual = current.unwrap_or(Generation::ZERO);

        if let Some(expected) = policy.expected_generation {
            if expected != actual {
                debug!(target: "recmap::store", %key, %expected, %actual, "Generation check failed");
                return Err(Error::Conflict {
                    key: key.clone(),
                    expected,
                    actual,
                });
            }
        }

        match policy.exists {
            RecordExistsAction::CreateOnly if current.is_some() => {
                return Err(Error::RecordExists { key: key.clone() });
            }
            RecordExistsAction::UpdateOnly if current.is_none() => {
                return Err(Error::store(format!("record not found: {}", key)));
            }
            _ => {}
        }

        let bins: BTreeMap<String, Value> = bins
            .iter()
            .filter(|bin| !bin.value.is_null())
            .map(|bin| (bin.name.clone(), bin.value.clone()))
            .collect();

        // Drops an expired predecessor too, so its generation restarts at 1
        shard.remove(&id);
        let generation = actual.next();
        shard.ttl_index.insert(void_time, id.clone());
        shard
            .data
            .insert(id, StoredRecord::new(bins, generation, void_time));

        Ok(generation)
    }

    fn delete(&self, key: &Key, expected_generation: Option<Generation>) -> Result<bool> {
        let now = self.clock.now();
        let mut entry = self
            .namespaces
            .get_mut(&key.namespace)
            .ok_or_else(|| Self::not_found(&key.namespace))?;
        let shard = &mut *entry;

        let id = Self::record_id(key);
        let current = shard.live(&id, now).map(StoredRecord::generation);

        if let Some(expected) = expected_generation {
            let actual = current.unwrap_or(Generation::ZERO);
            if expected != actual {
                return Err(Error::Conflict {
                    key: key.clone(),
                    expected,
                    actual,
                });
            }
        }

        // Expired leftovers go too, but only a live record counts as removed
        let removed = shard.remove(&id).is_some();
        Ok(removed && current.is_some())
    }

    fn namespace_default_ttl(&self, namespace: &str) -> Result<u32> {
        self.namespaces
            .get(namespace)
            .map(|shard| shard.config.default_ttl_secs)
            .ok_or_else(|| Self::not_found(namespace))
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for `MemoryStore`
#[derive(Default)]
pub struct MemoryStoreBuilder {
    namespaces: Vec<(String, NamespaceConfig)>,
    clock: Option<Arc<dyn Clock>>,
}

impl MemoryStoreBuilder {
    /// Add a namespace
    pub fn namespace(mut self, name: impl Into<String>, config: NamespaceConfig) -> Self {
        self.namespaces.push((name.into(), config));
        self
    }

    /// Use `clock` instead of the system clock
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the store
    pub fn build(self) -> MemoryStore {
        let store = MemoryStore {
            namespaces: DashMap::new(),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        };
        for (name, config) in self.namespaces {
            store.add_namespace(name, config);
        }
        store
    }
}
