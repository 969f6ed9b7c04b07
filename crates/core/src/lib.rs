//! Core types and traits for recmap
//!
//! This crate defines the foundational types used throughout the system:
//! - Value: Loosely typed bin value
//! - UserKey / Key: Record addressing (namespace → set → user key)
//! - Bin / Record: Write-set entries and read results
//! - Contract types: Generation, Timestamp, Clock
//! - Error: Error type hierarchy
//! - Limits: Store epoch, TTL sentinels and name limits
//! - Traits: The StoreClient abstraction over the underlying store

#![warn(missing_docs)]
#![warn(clippy::all)]

// Module declarations
pub mod contract;
pub mod error;
pub mod limits;
pub mod record;
pub mod traits;
pub mod types;
pub mod value;

// Re-export commonly used types and traits
pub use contract::{Clock, Generation, ManualClock, SystemClock, Timestamp};
pub use error::{Error, Result};
pub use record::{Bin, Record};
pub use traits::{RecordExistsAction, StoreClient, WritePolicy};
pub use types::{Key, UserKey};
pub use value::Value;
