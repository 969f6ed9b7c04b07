//! Bin values
//!
//! A record is schemaless: each bin carries its own type tag, and the set of
//! tags is fixed by the store:
//!
//! | Variant | Store particle |
//! |---------|----------------|
//! | `Null`  | absent / cleared bin |
//! | `Bool`  | boolean |
//! | `Int`   | 64-bit signed integer |
//! | `Float` | IEEE-754 double |
//! | `String`| UTF-8 string |
//! | `Bytes` | blob |
//! | `List`  | ordered collection |
//! | `Map`   | string-keyed collection |
//!
//! No coercion happens here. Whether `Int(1)` may fill a `bool` field is the
//! mapper's call, so equality is strictly per variant.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Value held by one bin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    /// Absent or cleared bin; never written to the store
    Null,
    /// Boolean particle
    Bool(bool),
    /// Integer particle
    Int(i64),
    /// Double particle
    Float(f64),
    /// String particle
    String(String),
    /// Blob particle
    Bytes(Vec<u8>),
    /// List particle
    List(Vec<Value>),
    /// Map particle
    Map(HashMap<String, Value>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            // NaN bins never compare equal, -0.0 matches 0.0
            (Float(a), Float(b)) => a == b,
            (String(a), String(b)) => a == b,
            (Bytes(a), Bytes(b)) => a == b,
            (List(a), List(b)) => a == b,
            (Map(a), Map(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// Particle name, used in mapping diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::String(_) => "String",
            Value::Bytes(_) => "Bytes",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
        }
    }

    /// Whether the bin is absent (skipped on write)
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

macro_rules! bin_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

bin_value_from! {
    bool => Bool,
    i64 => Int,
    f64 => Float,
    String => String,
    &str => String,
    Vec<u8> => Bytes,
}
