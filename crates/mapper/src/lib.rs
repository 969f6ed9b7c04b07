//! Entity to record mapping for recmap
//!
//! This crate turns Rust types into store records and back:
//! - BinValue: Field type ↔ bin value coercion
//! - Descriptor: Per-type mapping metadata, built from an `Entity` registration
//! - Registry: Process-wide descriptor cache keyed by type
//! - Constructor: Field-default instance construction
//! - Expiration: Absolute object expirations ↔ relative store TTLs
//! - EntityMapper: `serialize` / `materialize`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bin_value;
pub mod constructor;
pub mod descriptor;
pub mod expiration;
pub mod mapper;
pub mod registry;

pub use bin_value::{BinKind, BinValue, CoercionError, FieldType};
pub use constructor::Constructor;
pub use descriptor::{Descriptor, DescriptorBuilder, Entity, FieldDescriptor, FieldHandle, FieldRole};
pub use expiration::{record_expiration, to_object_time, to_store_time, ExpirationError};
pub use mapper::{EntityMapper, WriteSet};
pub use registry::descriptor;
