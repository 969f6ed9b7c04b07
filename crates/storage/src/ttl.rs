//! TTL index for efficient expiration cleanup
//!
//! This module provides TtlIndex that enables efficient queries for expired
//! records without scanning a whole namespace:
//! - Maps void_time → Set<RecordId> using BTreeMap for sorted order
//! - find_expired() returns all records whose void time has passed
//! - O(expired count) instead of O(total data)

use std::collections::{BTreeMap, HashSet};

use crate::stored_record::RecordId;

/// TTL index: void_time → record ids
///
/// Void times are seconds since the store epoch. Records that never expire
/// (void time 0) are never indexed.
#[derive(Debug, Default)]
pub struct TtlIndex {
    /// Index mapping void time to records expiring at that second
    index: BTreeMap<u32, HashSet<RecordId>>,
}

impl TtlIndex {
    /// Create a new empty TtlIndex
    pub fn new() -> Self {
        Self {
            index: BTreeMap::new(),
        }
    }

    /// Add a record with the given void time
    pub fn insert(&mut self, void_time: u32, id: RecordId) {
        if void_time == 0 {
            return;
        }
        self.index.entry(void_time).or_default().insert(id);
    }

    /// Remove a record at the given void time
    ///
    /// Used when a record is deleted or overwritten.
    /// If the set becomes empty, removes the void time entry entirely.
    pub fn remove(&mut self, void_time: u32, id: &RecordId) {
        if let Some(ids) = self.index.get_mut(&void_time) {
            ids.remove(id);
            if ids.is_empty() {
                self.index.remove(&void_time);
            }
        }
    }

    /// Find all records whose void time is at or before `now_void`
    pub fn find_expired(&self, now_void: u32) -> Vec<RecordId> {
        if now_void == 0 {
            return Vec::new();
        }
        self.index
            .range(1..=now_void)
            .flat_map(|(_, ids)| ids.iter().cloned())
            .collect()
    }

    /// Drop every entry at or before `now_void`
    ///
    /// Returns the number of entries removed.
    pub fn remove_expired(&mut self, now_void: u32) -> usize {
        if now_void == 0 {
            return 0;
        }
        let expired: Vec<u32> = self.index.range(1..=now_void).map(|(t, _)| *t).collect();

        let mut count = 0;
        for t in expired {
            if let Some(ids) = self.index.remove(&t) {
                count += ids.len();
            }
        }
        count
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Get the total number of records in the index
    pub fn len(&self) -> usize {
        self.index.values().map(|ids| ids.len()).sum()
    }
}
