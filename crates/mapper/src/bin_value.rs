//! Conversion between Rust field types and bin values
//!
//! Every field a mapped type declares must implement `BinValue`. The trait
//! converts a field to the store's loosely typed `Value` and back, and reports
//! a `FieldType` so role checks (key, expiration, generation) happen when the
//! descriptor is built instead of on the first write.
//!
//! Supported out of the box:
//! - `bool`, `i8`..`i64`, `u8`..`u32`, `f32`, `f64`, `String`
//! - `Vec<u8>` as bytes, any other `Vec<T>` as a list
//! - `HashMap<String, T>` and `BTreeMap<String, T>` as maps
//! - `Option<T>` as a nullable `T`
//!
//! Nested object graphs are flattened by implementing `BinValue` for them,
//! usually into a map.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use recmap_core::Value;
use thiserror::Error;

// =============================================================================
// Field types
// =============================================================================

/// Shape of a bin value as seen by a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinKind {
    /// Boolean
    Bool,
    /// Integer of the given width
    Int {
        /// Width in bits
        bits: u32,
        /// Whether the Rust type is signed
        signed: bool,
    },
    /// Floating point
    Float,
    /// UTF-8 string
    String,
    /// Byte sequence
    Bytes,
    /// List of values
    List,
    /// String-keyed map of values
    Map,
}

impl BinKind {
    /// Check if values of this kind can serve as a record key
    pub fn is_key_compatible(&self) -> bool {
        matches!(self, BinKind::Int { .. } | BinKind::String | BinKind::Bytes)
    }

    /// Largest positive integer this kind can hold, for integer kinds
    pub fn max_int(&self) -> Option<u64> {
        match *self {
            BinKind::Int { bits, signed } => {
                let bits = if signed { bits - 1 } else { bits };
                Some(if bits >= 64 { u64::MAX } else { (1u64 << bits) - 1 })
            }
            _ => None,
        }
    }
}

impl fmt::Display for BinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinKind::Bool => write!(f, "bool"),
            BinKind::Int { bits, signed: true } => write!(f, "i{}", bits),
            BinKind::Int { bits, signed: false } => write!(f, "u{}", bits),
            BinKind::Float => write!(f, "float"),
            BinKind::String => write!(f, "string"),
            BinKind::Bytes => write!(f, "bytes"),
            BinKind::List => write!(f, "list"),
            BinKind::Map => write!(f, "map"),
        }
    }
}

/// Declared type of a mapped field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldType {
    /// Shape of the non-null value
    pub kind: BinKind,
    /// Whether the field accepts null
    pub nullable: bool,
}

impl FieldType {
    /// Non-nullable field of `kind`
    pub const fn of(kind: BinKind) -> Self {
        Self {
            kind,
            nullable: false,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "optional {}", self.kind)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

// =============================================================================
// Coercion errors
// =============================================================================

/// A bin value does not fit a field
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoercionError {
    /// The value has the wrong type
    #[error("expected {expected}, found {found}")]
    Mismatch {
        /// Type the field needs
        expected: String,
        /// Type name of the value
        found: &'static str,
    },

    /// An integer is outside the field's range
    #[error("integer {value} out of range for {target}")]
    OutOfRange {
        /// The value
        value: i64,
        /// Field type
        target: &'static str,
    },

    /// A finite double does not fit a single-precision field
    #[error("float {value} out of range for f32")]
    FloatOutOfRange {
        /// The value
        value: f64,
    },

    /// An element of a list or map failed
    #[error("element {index}: {source}")]
    Element {
        /// Position or map key
        index: String,
        /// Underlying failure
        #[source]
        source: Box<CoercionError>,
    },
}

impl CoercionError {
    /// Value of the wrong type
    pub fn mismatch(expected: impl fmt::Display, found: &Value) -> Self {
        CoercionError::Mismatch {
            expected: expected.to_string(),
            found: found.type_name(),
        }
    }

    fn element(index: impl fmt::Display, source: CoercionError) -> Self {
        CoercionError::Element {
            index: index.to_string(),
            source: Box::new(source),
        }
    }
}

// =============================================================================
// BinValue
// =============================================================================

/// A field type that maps to a bin value
pub trait BinValue: Sized + Send + Sync + 'static {
    /// Declared type, checked against field roles at descriptor build time
    fn field_type() -> FieldType;

    /// Convert to a bin value
    fn to_value(&self) -> Value;

    /// Convert from a bin value
    ///
    /// # Errors
    ///
    /// Returns a `CoercionError` when the value has the wrong type or range.
    fn from_value(value: Value) -> Result<Self, CoercionError>;

    /// Field type of `Vec<Self>`
    #[doc(hidden)]
    fn vec_field_type() -> FieldType {
        FieldType::of(BinKind::List)
    }

    /// Convert `&[Self]` to a bin value
    #[doc(hidden)]
    fn slice_to_value(items: &[Self]) -> Value {
        Value::List(items.iter().map(BinValue::to_value).collect())
    }

    /// Convert a bin value to `Vec<Self>`
    #[doc(hidden)]
    fn vec_from_value(value: Value) -> Result<Vec<Self>, CoercionError> {
        match value {
            Value::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| Self::from_value(item).map_err(|e| CoercionError::element(i, e)))
                .collect(),
            other => Err(CoercionError::mismatch(BinKind::List, &other)),
        }
    }
}

impl BinValue for bool {
    fn field_type() -> FieldType {
        FieldType::of(BinKind::Bool)
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        match value {
            Value::Bool(b) => Ok(b),
            // Stores without a boolean type persist flags as 0/1
            Value::Int(0) => Ok(false),
            Value::Int(1) => Ok(true),
            Value::Int(i) => Err(CoercionError::OutOfRange {
                value: i,
                target: "bool",
            }),
            other => Err(CoercionError::mismatch(BinKind::Bool, &other)),
        }
    }
}

macro_rules! impl_int_bin_value {
    ($($ty:ty => $bits:expr, $signed:expr);* $(;)?) => {
        $(
            impl BinValue for $ty {
                fn field_type() -> FieldType {
                    FieldType::of(BinKind::Int { bits: $bits, signed: $signed })
                }

                fn to_value(&self) -> Value {
                    Value::Int(i64::from(*self))
                }

                fn from_value(value: Value) -> Result<Self, CoercionError> {
                    match value {
                        Value::Int(i) => <$ty>::try_from(i).map_err(|_| CoercionError::OutOfRange {
                            value: i,
                            target: stringify!($ty),
                        }),
                        other => Err(CoercionError::mismatch(Self::field_type().kind, &other)),
                    }
                }
            }
        )*
    };
}

impl_int_bin_value! {
    i8 => 8, true;
    i16 => 16, true;
    i32 => 32, true;
    i64 => 64, true;
    u16 => 16, false;
    u32 => 32, false;
}

impl BinValue for u8 {
    fn field_type() -> FieldType {
        FieldType::of(BinKind::Int {
            bits: 8,
            signed: false,
        })
    }

    fn to_value(&self) -> Value {
        Value::Int(i64::from(*self))
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        match value {
            Value::Int(i) => u8::try_from(i).map_err(|_| CoercionError::OutOfRange {
                value: i,
                target: "u8",
            }),
            other => Err(CoercionError::mismatch(Self::field_type().kind, &other)),
        }
    }

    // Vec<u8> is a byte sequence, not a list of integers
    fn vec_field_type() -> FieldType {
        FieldType::of(BinKind::Bytes)
    }

    fn slice_to_value(items: &[Self]) -> Value {
        Value::Bytes(items.to_vec())
    }

    fn vec_from_value(value: Value) -> Result<Vec<Self>, CoercionError> {
        match value {
            Value::Bytes(bytes) => Ok(bytes),
            other => Err(CoercionError::mismatch(BinKind::Bytes, &other)),
        }
    }
}

impl BinValue for f64 {
    fn field_type() -> FieldType {
        FieldType::of(BinKind::Float)
    }

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        match value {
            Value::Float(f) => Ok(f),
            other => Err(CoercionError::mismatch(BinKind::Float, &other)),
        }
    }
}

impl BinValue for f32 {
    fn field_type() -> FieldType {
        FieldType::of(BinKind::Float)
    }

    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        match value {
            // Narrowing rounds to the nearest f32; only overflow is an error
            Value::Float(f) => {
                let narrowed = f as f32;
                if f.is_finite() && !narrowed.is_finite() {
                    Err(CoercionError::FloatOutOfRange { value: f })
                } else {
                    Ok(narrowed)
                }
            }
            other => Err(CoercionError::mismatch(BinKind::Float, &other)),
        }
    }
}

impl BinValue for String {
    fn field_type() -> FieldType {
        FieldType::of(BinKind::String)
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(CoercionError::mismatch(BinKind::String, &other)),
        }
    }
}

impl<T: BinValue> BinValue for Vec<T> {
    fn field_type() -> FieldType {
        T::vec_field_type()
    }

    fn to_value(&self) -> Value {
        T::slice_to_value(self)
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        T::vec_from_value(value)
    }
}

impl<T: BinValue> BinValue for Option<T> {
    fn field_type() -> FieldType {
        FieldType {
            nullable: true,
            ..T::field_type()
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Some(inner) => inner.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: BinValue> BinValue for HashMap<String, T> {
    fn field_type() -> FieldType {
        FieldType::of(BinKind::Map)
    }

    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.clone(), v.to_value()))
                .collect(),
        )
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        match value {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| match T::from_value(v) {
                    Ok(v) => Ok((k, v)),
                    Err(e) => Err(CoercionError::element(k, e)),
                })
                .collect(),
            other => Err(CoercionError::mismatch(BinKind::Map, &other)),
        }
    }
}

impl<T: BinValue> BinValue for BTreeMap<String, T> {
    fn field_type() -> FieldType {
        FieldType::of(BinKind::Map)
    }

    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.clone(), v.to_value()))
                .collect(),
        )
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        match value {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| match T::from_value(v) {
                    Ok(v) => Ok((k, v)),
                    Err(e) => Err(CoercionError::element(k, e)),
                })
                .collect(),
            other => Err(CoercionError::mismatch(BinKind::Map, &other)),
        }
    }
}
