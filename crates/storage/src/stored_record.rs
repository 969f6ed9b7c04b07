//! Storage-layer record wrapper
//!
//! `Record` is what callers see. `StoredRecord` is what a namespace shard
//! keeps: the bins plus generation and void time, without the key (the key
//! is the map entry's key).

use std::collections::BTreeMap;

use recmap_core::limits::unix_secs_to_void_time;
use recmap_core::{Generation, Key, Record, Timestamp, UserKey, Value};

/// Identity of a record within one namespace: (set name, user key)
pub type RecordId = (String, UserKey);

/// A record as held by a namespace shard
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    bins: BTreeMap<String, Value>,
    generation: Generation,
    void_time: u32,
}

impl StoredRecord {
    /// Create a stored record
    pub fn new(bins: BTreeMap<String, Value>, generation: Generation, void_time: u32) -> Self {
        Self {
            bins,
            generation,
            void_time,
        }
    }

    /// Get the bins
    #[inline]
    pub fn bins(&self) -> &BTreeMap<String, Value> {
        &self.bins
    }

    /// Get the generation
    #[inline]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Get the void time (0 = never expires)
    #[inline]
    pub fn void_time(&self) -> u32 {
        self.void_time
    }

    /// Check if this record has expired at `now`
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.void_time != 0 && self.void_time <= unix_secs_to_void_time(now.as_secs())
    }

    /// Build the caller-facing record
    pub fn to_record(&self, key: &Key) -> Record {
        Record::new(key.clone(), self.bins.clone(), self.generation, self.void_time)
    }
}
