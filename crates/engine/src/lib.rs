//! Session layer for recmap
//!
//! This crate ties the lower layers together:
//! - Session: load / insert / update / delete of mapped objects
//! - Transactions: `transact` with generation-checked retry
//! - SessionConfig: `recmap.toml` configuration
//!
//! The session is the only component that knows about:
//! - The default namespace
//! - Which write policy each whole-object operation uses

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod session;

pub use session::{Session, SessionBuilder, SessionConfig, CONFIG_FILE_NAME};
