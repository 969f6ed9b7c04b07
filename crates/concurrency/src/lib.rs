//! Concurrency layer for recmap
//!
//! This crate implements optimistic concurrency control on top of the
//! store's per-record generations:
//! - TransactionContext: Per-attempt reads and generation-checked writes
//! - TransactionManager: Bounded retry of units of work on conflict
//! - RetryConfig: Retry budget and exponential backoff
//! - TransactionStats: Attempt, commit, conflict and exhaustion counters
//!
//! The store is the only arbiter of generation order. Nothing here locks.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod manager;
pub mod retry;

pub use context::TransactionContext;
pub use manager::{TransactionManager, TransactionMetrics, TransactionStats, DEFAULT_NAMESPACE};
pub use retry::RetryConfig;
