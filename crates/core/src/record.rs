//! Store-side record representation
//!
//! A `Record` is what a read returns: the bins plus the metadata the store
//! keeps for every record. A `Bin` is one named value of a write set.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::contract::{Generation, Timestamp};
use crate::limits::{void_time_to_unix_secs, TTL_NEVER_EXPIRE};
use crate::types::Key;
use crate::value::Value;

/// A single named value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    /// Bin name
    pub name: String,
    /// Bin value
    pub value: Value,
}

impl Bin {
    /// Create a new bin
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A record as read from the store
///
/// Records are snapshots: nothing keeps them in sync with the store after the
/// read that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Address of the record
    pub key: Key,
    /// Bins by name
    pub bins: BTreeMap<String, Value>,
    /// Generation at the time of the read
    pub generation: Generation,
    /// Absolute expiration in seconds since the store epoch, 0 = never expires
    pub void_time: u32,
}

impl Record {
    /// Create a record
    pub fn new(
        key: Key,
        bins: BTreeMap<String, Value>,
        generation: Generation,
        void_time: u32,
    ) -> Self {
        Self {
            key,
            bins,
            generation,
            void_time,
        }
    }

    /// Get a bin value by name
    pub fn bin(&self, name: &str) -> Option<&Value> {
        self.bins.get(name)
    }

    /// Whether the record has a finite expiration
    pub fn expires(&self) -> bool {
        self.void_time != 0
    }

    /// Instant the record expires, `None` if it never does
    pub fn expires_at(&self) -> Option<Timestamp> {
        void_time_to_unix_secs(self.void_time).map(Timestamp::from_secs)
    }

    /// Relative TTL in seconds as seen at `now`
    ///
    /// Returns -1 for records that never expire. Partial seconds round up; a
    /// record whose void time has already passed but which is still visible
    /// reports 1 second.
    pub fn time_to_live(&self, now: Timestamp) -> i64 {
        match self.expires_at() {
            None => TTL_NEVER_EXPIRE,
            Some(expires_at) => {
                let remaining_ms = expires_at.as_millis().saturating_sub(now.as_millis());
                let remaining = remaining_ms.div_euclid(1_000)
                    + i64::from(remaining_ms.rem_euclid(1_000) != 0);
                remaining.max(1)
            }
        }
    }
}
