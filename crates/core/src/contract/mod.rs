//! Contract types shared by the mapper, the transaction engine and stores
//!
//! These types fix the meaning of the two record attributes that are not
//! bins: when a record expires and which generation it is at.
//!
//! ## Module Structure
//!
//! - `timestamp`: Millisecond wall-clock timestamps (object-side expiration)
//! - `clock`: Injectable time source
//! - `generation`: Store-maintained record version counter
//!
//! ## Usage
//!
//! ```
//! use recmap_core::contract::{Clock, Generation, SystemClock, Timestamp};
//! ```

pub mod clock;
pub mod generation;
pub mod timestamp;

// Re-exports
pub use clock::{Clock, ManualClock, SystemClock};
pub use generation::Generation;
pub use timestamp::Timestamp;
