//! Entity mapper
//!
//! Converts mapped objects into write sets and records back into objects.
//!
//! - `serialize` walks the data fields in declaration order and converts the
//!   expiration field to a store TTL. The generation is returned beside the
//!   bins so the caller can use it as a write precondition.
//! - `materialize` builds a fresh instance and fills it from a record. Bins
//!   the record lacks leave fields at their constructed default; bins the
//!   type does not declare are ignored.
//!
//! All errors are `Error::Mapping` (or `Error::Instantiation`) and are raised
//! before the caller touches the store.

use std::sync::Arc;

use recmap_core::{
    Bin, Clock, Error, Generation, Key, Record, Result, SystemClock, UserKey, Value, WritePolicy,
};
use uuid::Uuid;

use crate::bin_value::{BinKind, FieldType};
use crate::descriptor::{Descriptor, Entity, FieldDescriptor};
use crate::expiration::{record_expiration, to_store_time};
use crate::registry::descriptor;

/// What `serialize` produces for one object
#[derive(Debug, Clone, PartialEq)]
pub struct WriteSet {
    /// Namespace pinned by the type, if any
    pub namespace: Option<String>,
    /// Set the record belongs to
    pub set_name: String,
    /// Key from the key field; `None` when the type has none or it is null
    pub user_key: Option<UserKey>,
    /// Data bins in declaration order
    pub bins: Vec<Bin>,
    /// Store TTL in seconds (-1 never, 0 namespace default)
    pub expiration: i64,
    /// Generation from the generation field; `None` when the type has none
    pub generation: Option<Generation>,
}

impl WriteSet {
    /// Full key, when the object carries one
    pub fn key(&self, default_namespace: &str) -> Option<Key> {
        self.user_key.clone().map(|user_key| {
            Key::new(
                self.namespace.as_deref().unwrap_or(default_namespace),
                self.set_name.as_str(),
                user_key,
            )
        })
    }

    /// Write policy carrying this write set's expiration
    pub fn write_policy(&self) -> WritePolicy {
        WritePolicy::default().with_expiration(self.expiration)
    }

    /// Generation usable as a precondition (non-zero generation field)
    pub fn known_generation(&self) -> Option<Generation> {
        self.generation.filter(|g| !g.is_zero())
    }
}

/// Converts between mapped objects and records
#[derive(Clone)]
pub struct EntityMapper {
    clock: Arc<dyn Clock>,
}

impl EntityMapper {
    /// Mapper resolving expirations against `clock`
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Mapper on the system clock
    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    /// Clock used for expiration conversion
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Convert an object into a write set
    ///
    /// # Errors
    ///
    /// - `Mapping` if `T` cannot be mapped
    /// - `Mapping` if the expiration field holds an unusable value
    pub fn serialize<T: Entity>(&self, obj: &T) -> Result<WriteSet> {
        let desc = descriptor::<T>()?;

        let bins = desc
            .data_fields()
            .map(|field| Bin::new(field.bin(), field.read(obj)))
            .collect();

        let user_key = match desc.key_field() {
            Some(field) => user_key_of(&desc, field, field.read(obj))?,
            None => None,
        };

        let expiration = match desc.expiration_field() {
            Some(field) => {
                let expires_at = match field.read(obj) {
                    Value::Int(ms) => ms,
                    Value::Null => 0,
                    other => return Err(type_error(&desc, field, &other)),
                };
                to_store_time(expires_at, self.clock.now())
                    .map_err(|e| field_error(&desc, field, e))?
            }
            None => 0,
        };

        let generation = match desc.generation_field() {
            Some(field) => Some(generation_of(&desc, field, field.read(obj))?),
            None => None,
        };

        Ok(WriteSet {
            namespace: desc.namespace().map(str::to_string),
            set_name: desc.set_name().to_string(),
            user_key,
            bins,
            expiration,
            generation,
        })
    }

    /// Build an object from a record
    ///
    /// # Errors
    ///
    /// - `Instantiation` if the constructor refuses
    /// - `Mapping` if a bin or the key does not fit its field
    pub fn materialize<T: Entity>(&self, record: &Record) -> Result<T> {
        let desc = descriptor::<T>()?;
        let mut obj = desc.instantiate()?;

        for field in desc.data_fields() {
            if let Some(value) = record.bins.get(field.bin()) {
                field
                    .write(&mut obj, value.clone())
                    .map_err(|e| field_error(&desc, field, e))?;
            }
        }

        if let Some(field) = desc.key_field() {
            field
                .write(&mut obj, user_key_value(&record.key.user_key))
                .map_err(|e| field_error(&desc, field, e))?;
        }

        if let Some(field) = desc.expiration_field() {
            let expires_at = record_expiration(&record);
            field
                .write(&mut obj, Value::Int(expires_at))
                .map_err(|e| field_error(&desc, field, e))?;
        }

        if let Some(field) = desc.generation_field() {
            set_generation(&desc, field, &mut obj, record.generation)?;
        }

        Ok(obj)
    }

    /// Key of an object, generating one when the key field is null
    ///
    /// A generated key is written back into the key field. Types without a
    /// key field get a fresh string key that is not stored on the object.
    ///
    /// # Errors
    ///
    /// Returns `Mapping` if `T` cannot be mapped.
    pub fn key_for<T: Entity>(&self, obj: &mut T, default_namespace: &str) -> Result<Key> {
        let desc = descriptor::<T>()?;
        let field = match desc.key_field() {
            Some(field) => field,
            None => return Ok(desc.key(generate_key(BinKind::String), default_namespace)),
        };

        if let Some(user_key) = user_key_of(&desc, field, field.read(obj))? {
            return Ok(desc.key(user_key, default_namespace));
        }

        let user_key = generate_key(field.field_type().kind);
        let user_key = match (&user_key, field.field_type()) {
            (
                UserKey::Int(n),
                FieldType {
                    kind: kind @ BinKind::Int { .. },
                    ..
                },
            ) => UserKey::Int(fit_int(*n, kind)),
            _ => user_key,
        };
        field
            .write(obj, user_key_value(&user_key))
            .map_err(|e| field_error(&desc, field, e))?;
        Ok(desc.key(user_key, default_namespace))
    }

    /// Key of an object without generating one
    ///
    /// # Errors
    ///
    /// Returns `Mapping` if `T` cannot be mapped.
    pub fn key_of<T: Entity>(&self, obj: &T, default_namespace: &str) -> Result<Option<Key>> {
        let desc = descriptor::<T>()?;
        match desc.key_field() {
            Some(field) => Ok(user_key_of(&desc, field, field.read(obj))?
                .map(|user_key| desc.key(user_key, default_namespace))),
            None => Ok(None),
        }
    }

    /// Generation held by an object's generation field
    ///
    /// # Errors
    ///
    /// Returns `Mapping` if `T` cannot be mapped.
    pub fn generation_of<T: Entity>(&self, obj: &T) -> Result<Option<Generation>> {
        let desc = descriptor::<T>()?;
        match desc.generation_field() {
            Some(field) => Ok(Some(generation_of(&desc, field, field.read(obj))?)),
            None => Ok(None),
        }
    }

    /// Store a generation in an object's generation field, if it has one
    ///
    /// # Errors
    ///
    /// Returns `Mapping` if `T` cannot be mapped or the field cannot hold it.
    pub fn set_generation<T: Entity>(&self, obj: &mut T, generation: Generation) -> Result<()> {
        let desc = descriptor::<T>()?;
        match desc.generation_field() {
            Some(field) => set_generation(&desc, field, obj, generation),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for EntityMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityMapper")
            .field("now", &self.clock.now())
            .finish()
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn field_error<T>(desc: &Descriptor<T>, field: &FieldDescriptor<T>, e: impl std::fmt::Display) -> Error {
    Error::mapping_bin(
        desc.type_name(),
        field.bin(),
        format!("field '{}': {}", field.name(), e),
    )
}

fn type_error<T>(desc: &Descriptor<T>, field: &FieldDescriptor<T>, found: &Value) -> Error {
    field_error(
        desc,
        field,
        format!("unexpected {} value", found.type_name()),
    )
}

fn user_key_of<T>(
    desc: &Descriptor<T>,
    field: &FieldDescriptor<T>,
    value: Value,
) -> Result<Option<UserKey>> {
    match value {
        Value::Null => Ok(None),
        Value::Int(i) => Ok(Some(UserKey::Int(i))),
        Value::String(s) => Ok(Some(UserKey::String(s))),
        Value::Bytes(b) => Ok(Some(UserKey::Bytes(b))),
        other => Err(type_error(desc, field, &other)),
    }
}

fn user_key_value(user_key: &UserKey) -> Value {
    match user_key {
        UserKey::Int(i) => Value::Int(*i),
        UserKey::String(s) => Value::String(s.clone()),
        UserKey::Bytes(b) => Value::Bytes(b.clone()),
    }
}

fn generation_of<T>(
    desc: &Descriptor<T>,
    field: &FieldDescriptor<T>,
    value: Value,
) -> Result<Generation> {
    match value {
        Value::Null => Ok(Generation::ZERO),
        Value::Int(i) => u32::try_from(i)
            .map(Generation::new)
            .map_err(|_| field_error(desc, field, format!("generation {} out of range", i))),
        other => Err(type_error(desc, field, &other)),
    }
}

fn set_generation<T>(
    desc: &Descriptor<T>,
    field: &FieldDescriptor<T>,
    obj: &mut T,
    generation: Generation,
) -> Result<()> {
    field
        .write(obj, Value::Int(i64::from(generation.as_u32())))
        .map_err(|e| field_error(desc, field, e))
}

/// Fresh random key of the given kind
///
/// Strings use the simple UUID form, bytes the 16 UUID bytes and integers a
/// positive value derived from the UUID.
fn generate_key(kind: BinKind) -> UserKey {
    let uuid = Uuid::new_v4();
    match kind {
        BinKind::Bytes => UserKey::Bytes(uuid.as_bytes().to_vec()),
        BinKind::Int { .. } => {
            let n = (uuid.as_u128() as u64) & (i64::MAX as u64);
            UserKey::Int(n.max(1) as i64)
        }
        _ => UserKey::String(uuid.simple().to_string()),
    }
}

/// Fold a positive key into `1..=max` of a narrower integer field
fn fit_int(n: i64, kind: BinKind) -> i64 {
    match kind.max_int() {
        Some(max) if max < i64::MAX as u64 => ((n as u64 - 1) % max + 1) as i64,
        _ => n,
    }
}
