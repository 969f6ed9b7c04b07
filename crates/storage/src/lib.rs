//! Storage layer for recmap
//!
//! This crate implements an in-process record store with:
//! - MemoryStore: DashMap of namespace shards, FxHashMap per namespace
//! - Generation counters with atomic generation-checked writes
//! - Void-time expiration, hidden lazily on read
//! - TTL index for eviction
//!
//! `MemoryStore` implements `recmap_core::StoreClient`, so everything built
//! on the store abstraction runs against it unchanged.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod memory;
pub mod stored_record;
pub mod ttl;

pub use memory::{MemoryStore, MemoryStoreBuilder, NamespaceConfig, NamespaceShard};
pub use stored_record::{RecordId, StoredRecord};
pub use ttl::TtlIndex;
