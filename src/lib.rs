//! recmap - Entity-to-record mapping for schemaless key/value stores
//!
//! recmap maps plain Rust structs onto records (namespace → set → user key →
//! named bins) and layers optimistic, generation-checked transactions on top.
//!
//! # Quick Start
//!
//! ```ignore
//! use recmap::{DescriptorBuilder, Entity, MemoryStore, Session};
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct Counter {
//!     id: String,
//!     hits: i64,
//!     generation: u32,
//! }
//!
//! impl Entity for Counter {
//!     fn describe(b: &mut DescriptorBuilder<Self>) {
//!         b.set_name("counters");
//!         b.field("id", |c| &c.id, |c| &mut c.id).key();
//!         b.field("hits", |c| &c.hits, |c| &mut c.hits);
//!         b.field("generation", |c| &c.generation, |c| &mut c.generation).generation();
//!         b.default_constructor();
//!     }
//! }
//!
//! let session = Session::builder(Arc::new(MemoryStore::new())).build()?;
//! session.insert(&mut Counter { id: "home".into(), ..Counter::default() })?;
//!
//! session.transact(5, |ctx| {
//!     let mut c: Counter = ctx.get_by("home")?.unwrap_or_default();
//!     c.hits += 1;
//!     ctx.put(&mut c)
//! })?;
//! ```
//!
//! # Architecture
//!
//! - `recmap-core`: values, keys, records, errors and the `StoreClient` trait
//! - `recmap-storage`: in-memory store with generations and TTL
//! - `recmap-mapper`: descriptors, bin conversion and expiration handling
//! - `recmap-concurrency`: the `transact` retry loop
//! - `recmap-engine`: `Session`, the entry point

pub use recmap_concurrency::{
    RetryConfig, TransactionContext, TransactionManager, TransactionMetrics, DEFAULT_NAMESPACE,
};
pub use recmap_core::limits;
pub use recmap_core::{
    Bin, Clock, Error, Generation, Key, ManualClock, Record, RecordExistsAction, Result,
    StoreClient, SystemClock, Timestamp, UserKey, Value, WritePolicy,
};
pub use recmap_engine::{Session, SessionBuilder, SessionConfig, CONFIG_FILE_NAME};
pub use recmap_mapper::{
    descriptor, to_object_time, to_store_time, BinKind, BinValue, Descriptor, DescriptorBuilder,
    Entity, EntityMapper, ExpirationError, FieldRole, FieldType,
};
pub use recmap_storage::{MemoryStore, MemoryStoreBuilder, NamespaceConfig};
