//! Type mapping metadata
//!
//! A `Descriptor` says how one Rust type maps to a record: which fields
//! become bins and under what names, and which fields carry the record key,
//! the expiration and the generation. Types opt in by implementing `Entity`
//! and registering their fields on a `DescriptorBuilder`:
//!
//! ```ignore
//! impl Entity for Account {
//!     fn describe(b: &mut DescriptorBuilder<Self>) {
//!         b.set_name("accounts");
//!         b.field("id", |a| &a.id, |a| &mut a.id).key();
//!         b.field("balance", |a| &a.balance, |a| &mut a.balance).bin("bal");
//!         b.field("expires_at", |a| &a.expires_at, |a| &mut a.expires_at).expiration();
//!         b.field("generation", |a| &a.generation, |a| &mut a.generation).generation();
//!         b.default_constructor();
//!     }
//! }
//! ```
//!
//! Every problem with a registration is reported when the descriptor is
//! built, before any record is read or written.
//!
//! ## Invariants
//!
//! - At most one field per role (key, expiration, generation)
//! - Bin names are unique, non-empty and at most `MAX_BIN_NAME_LEN` bytes
//! - The key field is an integer, string or bytes
//! - The expiration field is an `i64`
//! - The generation field can hold any `u32` generation (`u32` or `i64`)
//! - Role fields never become bins

use std::fmt;

use recmap_core::limits::{MAX_BIN_NAME_LEN, MAX_NAMESPACE_LEN, MAX_SET_NAME_LEN};
use recmap_core::{Error, Key, Result, UserKey, Value};

use crate::bin_value::{BinKind, BinValue, CoercionError, FieldType};
use crate::constructor::Constructor;

/// A type that can be mapped to records
pub trait Entity: Sized + Send + Sync + 'static {
    /// Register fields, roles, names and a constructor
    fn describe(b: &mut DescriptorBuilder<Self>);
}

// =============================================================================
// Fields
// =============================================================================

/// What a field is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    /// Plain data field, stored as a bin
    Data,
    /// Record key
    Key,
    /// Absolute expiration in Unix milliseconds (-1 = never)
    Expiration,
    /// Record generation
    Generation,
}

impl fmt::Display for FieldRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRole::Data => write!(f, "data"),
            FieldRole::Key => write!(f, "key"),
            FieldRole::Expiration => write!(f, "expiration"),
            FieldRole::Generation => write!(f, "generation"),
        }
    }
}

type Getter<T> = Box<dyn Fn(&T) -> Value + Send + Sync>;
type Setter<T> = Box<dyn Fn(&mut T, Value) -> std::result::Result<(), CoercionError> + Send + Sync>;

/// One registered field
pub struct FieldDescriptor<T> {
    name: String,
    bin: String,
    role: FieldRole,
    field_type: FieldType,
    get: Getter<T>,
    set: Setter<T>,
}

impl<T> FieldDescriptor<T> {
    /// Field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bin name (only meaningful for data fields)
    pub fn bin(&self) -> &str {
        &self.bin
    }

    /// Role of the field
    pub fn role(&self) -> FieldRole {
        self.role
    }

    /// Declared type
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Read the field as a bin value
    pub fn read(&self, obj: &T) -> Value {
        (self.get)(obj)
    }

    /// Overwrite the field from a bin value
    ///
    /// # Errors
    ///
    /// Returns a `CoercionError` when the value does not fit the field.
    pub fn write(&self, obj: &mut T, value: Value) -> std::result::Result<(), CoercionError> {
        (self.set)(obj, value)
    }
}

impl<T> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("bin", &self.bin)
            .field("role", &self.role)
            .field("field_type", &self.field_type)
            .finish()
    }
}

// =============================================================================
// Descriptor
// =============================================================================

/// Immutable mapping of a type to records
pub struct Descriptor<T> {
    type_name: String,
    set_name: String,
    namespace: Option<String>,
    fields: Vec<FieldDescriptor<T>>,
    key: Option<usize>,
    expiration: Option<usize>,
    generation: Option<usize>,
    constructor: Constructor<T>,
}

impl<T: Entity> Descriptor<T> {
    /// Build the descriptor of `T` from its registration
    ///
    /// # Errors
    ///
    /// Returns `Error::Mapping` describing the first problem found.
    pub fn build() -> Result<Self> {
        let mut builder = DescriptorBuilder::new();
        T::describe(&mut builder);
        builder.build()
    }
}

impl<T> Descriptor<T> {
    /// Unqualified type name
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Set the type's records live in
    pub fn set_name(&self) -> &str {
        &self.set_name
    }

    /// Namespace pinned by the type, if any
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// All fields in declaration order
    pub fn fields(&self) -> &[FieldDescriptor<T>] {
        &self.fields
    }

    /// Fields stored as bins, in declaration order
    pub fn data_fields(&self) -> impl Iterator<Item = &FieldDescriptor<T>> {
        self.fields.iter().filter(|f| f.role == FieldRole::Data)
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor<T>> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The key field
    pub fn key_field(&self) -> Option<&FieldDescriptor<T>> {
        self.key.map(|i| &self.fields[i])
    }

    /// The expiration field
    pub fn expiration_field(&self) -> Option<&FieldDescriptor<T>> {
        self.expiration.map(|i| &self.fields[i])
    }

    /// The generation field
    pub fn generation_field(&self) -> Option<&FieldDescriptor<T>> {
        self.generation.map(|i| &self.fields[i])
    }

    /// Whether the type takes part in generation checks
    pub fn has_generation(&self) -> bool {
        self.generation.is_some()
    }

    /// Resolve the namespace: the type's own, else `default_namespace`
    pub fn namespace_or<'a>(&'a self, default_namespace: &'a str) -> &'a str {
        self.namespace.as_deref().unwrap_or(default_namespace)
    }

    /// Key of a record of this type
    pub fn key(&self, user_key: impl Into<UserKey>, default_namespace: &str) -> Key {
        Key::new(
            self.namespace_or(default_namespace),
            self.set_name.as_str(),
            user_key,
        )
    }

    /// Build a field-default instance
    ///
    /// # Errors
    ///
    /// Returns `Error::Instantiation` when the constructor refuses.
    pub fn instantiate(&self) -> Result<T> {
        self.constructor.construct(&self.type_name)
    }
}

impl<T> fmt::Debug for Descriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("type_name", &self.type_name)
            .field("set_name", &self.set_name)
            .field("namespace", &self.namespace)
            .field("fields", &self.fields)
            .field("constructor", &self.constructor)
            .finish()
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Collects the registration of one type
pub struct DescriptorBuilder<T> {
    type_name: String,
    set_name: Option<String>,
    namespace: Option<String>,
    fields: Vec<FieldDescriptor<T>>,
    constructor: Option<Constructor<T>>,
    errors: Vec<String>,
}

impl<T: 'static> DescriptorBuilder<T> {
    /// Empty builder for `T`
    pub fn new() -> Self {
        Self {
            type_name: short_type_name(std::any::type_name::<T>()).to_string(),
            set_name: None,
            namespace: None,
            fields: Vec::new(),
            constructor: None,
            errors: Vec::new(),
        }
    }

    /// Store records in `name` instead of the type name
    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.set_name = Some(name.into());
        self
    }

    /// Pin records to `namespace` instead of the session default
    pub fn namespace(&mut self, namespace: impl Into<String>) -> &mut Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Register a field
    ///
    /// The field becomes a bin named after the field unless the returned
    /// handle renames it or gives it a role.
    ///
    /// # Arguments
    ///
    /// * `name` - Field name, also the default bin name
    /// * `get` - Borrow the field
    /// * `get_mut` - Borrow the field mutably
    pub fn field<F, G, M>(&mut self, name: &str, get: G, get_mut: M) -> FieldHandle<'_, T>
    where
        F: BinValue,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        self.fields.push(FieldDescriptor {
            name: name.to_string(),
            bin: name.to_string(),
            role: FieldRole::Data,
            field_type: F::field_type(),
            get: Box::new(move |obj: &T| get(obj).to_value()),
            set: Box::new(move |obj: &mut T, value: Value| {
                F::from_value(value).map(|v| *get_mut(obj) = v)
            }),
        });
        let index = self.fields.len() - 1;
        FieldHandle {
            builder: self,
            index,
        }
    }

    /// Construct instances with `f`
    pub fn constructor(&mut self, f: fn() -> T) -> &mut Self {
        self.constructor = Some(Constructor::Function(f));
        self
    }

    /// Construct instances with `T::default()`
    pub fn default_constructor(&mut self) -> &mut Self
    where
        T: Default,
    {
        self.constructor = Some(Constructor::Function(T::default));
        self
    }

    /// Construct instances with a closure that may refuse
    pub fn try_constructor<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn() -> std::result::Result<T, String> + Send + Sync + 'static,
    {
        self.constructor = Some(Constructor::fallible(f));
        self
    }

    /// Validate the registration and produce the descriptor
    ///
    /// # Errors
    ///
    /// Returns `Error::Mapping` describing the first problem found.
    pub fn build(self) -> Result<Descriptor<T>> {
        let type_name = self.type_name;
        let fail = |reason: String| Error::mapping(type_name.as_str(), reason);

        if let Some(reason) = self.errors.into_iter().next() {
            return Err(fail(reason));
        }

        let constructor = self.constructor.ok_or_else(|| {
            fail("no construction path registered (constructor, default_constructor or try_constructor)".to_string())
        })?;

        let set_name = self.set_name.unwrap_or_else(|| type_name.clone());
        if set_name.is_empty() || set_name.len() > MAX_SET_NAME_LEN {
            return Err(fail(format!(
                "set name '{}' must be 1..={} bytes",
                set_name, MAX_SET_NAME_LEN
            )));
        }
        if let Some(ns) = &self.namespace {
            if ns.is_empty() || ns.len() > MAX_NAMESPACE_LEN {
                return Err(fail(format!(
                    "namespace '{}' must be 1..={} bytes",
                    ns, MAX_NAMESPACE_LEN
                )));
            }
        }

        let fields = self.fields;
        let mut key = None;
        let mut expiration = None;
        let mut generation = None;

        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|f| f.name == field.name) {
                return Err(fail(format!("field '{}' registered twice", field.name)));
            }

            let slot = match field.role {
                FieldRole::Data => {
                    check_bin_name(&fields[..i], field).map_err(&fail)?;
                    continue;
                }
                FieldRole::Key => &mut key,
                FieldRole::Expiration => &mut expiration,
                FieldRole::Generation => &mut generation,
            };
            if let Some(prev) = *slot {
                let prev: &FieldDescriptor<T> = &fields[prev];
                return Err(fail(format!(
                    "fields '{}' and '{}' both claim the {} role",
                    prev.name, field.name, field.role
                )));
            }
            check_role_type(field).map_err(&fail)?;
            *slot = Some(i);
        }

        Ok(Descriptor {
            type_name,
            set_name,
            namespace: self.namespace,
            fields,
            key,
            expiration,
            generation,
            constructor,
        })
    }
}

impl<T: 'static> Default for DescriptorBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn check_bin_name<T>(
    earlier: &[FieldDescriptor<T>],
    field: &FieldDescriptor<T>,
) -> std::result::Result<(), String> {
    if field.bin.is_empty() || field.bin.len() > MAX_BIN_NAME_LEN {
        return Err(format!(
            "bin name '{}' of field '{}' must be 1..={} bytes",
            field.bin, field.name, MAX_BIN_NAME_LEN
        ));
    }
    if let Some(other) = earlier
        .iter()
        .find(|f| f.role == FieldRole::Data && f.bin == field.bin)
    {
        return Err(format!(
            "fields '{}' and '{}' both map to bin '{}'",
            other.name, field.name, field.bin
        ));
    }
    Ok(())
}

fn check_role_type<T>(field: &FieldDescriptor<T>) -> std::result::Result<(), String> {
    let kind = field.field_type.kind;
    let (ok, expected) = match field.role {
        FieldRole::Data => (true, ""),
        FieldRole::Key => (kind.is_key_compatible(), "an integer, string or bytes"),
        FieldRole::Expiration => (
            kind == BinKind::Int {
                bits: 64,
                signed: true,
            },
            "i64",
        ),
        // Must hold every store generation, so i32 is too narrow
        FieldRole::Generation => (
            matches!(kind, BinKind::Int { bits, signed } if bits > 32 || (bits == 32 && !signed)),
            "u32 or i64",
        ),
    };
    if ok {
        Ok(())
    } else {
        Err(format!(
            "{} field '{}' is {}, expected {}",
            field.role, field.name, field.field_type, expected
        ))
    }
}

fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

// =============================================================================
// FieldHandle
// =============================================================================

/// Refines a field just registered on a `DescriptorBuilder`
pub struct FieldHandle<'a, T> {
    builder: &'a mut DescriptorBuilder<T>,
    index: usize,
}

impl<'a, T> FieldHandle<'a, T> {
    /// Store the field under `name` instead of the field name
    pub fn bin(self, name: impl Into<String>) -> Self {
        self.builder.fields[self.index].bin = name.into();
        self
    }

    /// Use the field as the record key
    pub fn key(self) -> Self {
        self.assign(FieldRole::Key)
    }

    /// Use the field as the absolute expiration (Unix ms, -1 = never)
    pub fn expiration(self) -> Self {
        self.assign(FieldRole::Expiration)
    }

    /// Use the field as the record generation
    pub fn generation(self) -> Self {
        self.assign(FieldRole::Generation)
    }

    fn assign(self, role: FieldRole) -> Self {
        let current = self.builder.fields[self.index].role;
        if current != FieldRole::Data && current != role {
            let name = self.builder.fields[self.index].name.clone();
            self.builder.errors.push(format!(
                "field '{}' cannot be both {} and {}",
                name, current, role
            ));
        } else {
            self.builder.fields[self.index].role = role;
        }
        self
    }
}
