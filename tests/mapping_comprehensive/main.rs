//! Mapping Comprehensive Test Suite
//!
//! Cross-crate tests of the mapped session against the in-memory store.
//! Time is driven by a `ManualClock`, so nothing here sleeps for a TTL.
//!
//! ## Test Groups
//!
//! - `round_trip_tests.rs` - every supported field type survives write → read
//! - `expiration_tests.rs` - never-expire, namespace default, absolute future,
//!   relative-duration rejection
//! - `transaction_tests.rs` - generation monotonicity, retry exhaustion,
//!   non-retryable failures
//! - `descriptor_tests.rs` - descriptor rejection before any store call
//! - `session_api_tests.rs` - insert / update / delete preconditions, config
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test mapping_comprehensive
//!
//! # One group
//! cargo test --test mapping_comprehensive expiration
//! ```

mod test_utils;

mod descriptor_tests;
mod round_trip_tests;
mod session_api_tests;
mod transaction_tests;
