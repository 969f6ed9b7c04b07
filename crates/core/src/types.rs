//! Record addressing types
//!
//! This module defines:
//! - UserKey: The caller-chosen primary key of a record (integer, string or bytes)
//! - Key: Fully qualified record address (namespace → set → user key)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Primary key value of a record
///
/// The store only accepts three primitive key types. Anything a mapped type
/// declares as its key field must convert into one of these.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UserKey {
    /// Integer key
    Int(i64),
    /// String key
    String(String),
    /// Binary key
    Bytes(Vec<u8>),
}

impl UserKey {
    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            UserKey::Int(_) => "Int",
            UserKey::String(_) => "String",
            UserKey::Bytes(_) => "Bytes",
        }
    }
}

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserKey::Int(i) => write!(f, "{}", i),
            UserKey::String(s) => write!(f, "{:?}", s),
            UserKey::Bytes(b) => {
                write!(f, "0x")?;
                for byte in b {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
        }
    }
}

impl From<i64> for UserKey {
    fn from(i: i64) -> Self {
        UserKey::Int(i)
    }
}

impl From<&str> for UserKey {
    fn from(s: &str) -> Self {
        UserKey::String(s.to_string())
    }
}

impl From<String> for UserKey {
    fn from(s: String) -> Self {
        UserKey::String(s)
    }
}

impl From<Vec<u8>> for UserKey {
    fn from(b: Vec<u8>) -> Self {
        UserKey::Bytes(b)
    }
}

/// Fully qualified record address
///
/// A record is identified by namespace, set name and user key. Two keys
/// address the same record only if all three components are equal.
///
/// Format: "namespace/set/user_key"
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Key {
    /// Namespace (top-level storage partition with its own TTL policy)
    pub namespace: String,
    /// Set name (table-like grouping inside a namespace)
    pub set_name: String,
    /// Primary key within the set
    pub user_key: UserKey,
}

impl Key {
    /// Create a new key
    pub fn new(
        namespace: impl Into<String>,
        set_name: impl Into<String>,
        user_key: impl Into<UserKey>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            set_name: set_name.into(),
            user_key: user_key.into(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.set_name, self.user_key)
    }
}
