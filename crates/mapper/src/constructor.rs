//! Construction of fresh instances
//!
//! Materializing a record starts from a field-default instance of the
//! target type. The type registers how to build one; no business-level
//! arguments are ever supplied.

use std::fmt;
use std::sync::Arc;

use recmap_core::{Error, Result};

type FallibleFn<T> = Arc<dyn Fn() -> std::result::Result<T, String> + Send + Sync>;

/// How to build a field-default instance of `T`
pub enum Constructor<T> {
    /// Infallible function (`T::default`, `T::new`, ...)
    Function(fn() -> T),
    /// Closure that may refuse, with a reason
    Fallible(FallibleFn<T>),
}

impl<T> Constructor<T> {
    /// Wrap a fallible closure
    pub fn fallible<F>(f: F) -> Self
    where
        F: Fn() -> std::result::Result<T, String> + Send + Sync + 'static,
    {
        Constructor::Fallible(Arc::new(f))
    }

    /// Build an instance
    ///
    /// # Errors
    ///
    /// Returns `Error::Instantiation` naming `type_name` when a fallible
    /// constructor refuses.
    pub fn construct(&self, type_name: &str) -> Result<T> {
        match self {
            Constructor::Function(f) => Ok(f()),
            Constructor::Fallible(f) => f().map_err(|reason| Error::instantiation(type_name, reason)),
        }
    }
}

impl<T> Clone for Constructor<T> {
    fn clone(&self) -> Self {
        match self {
            Constructor::Function(f) => Constructor::Function(*f),
            Constructor::Fallible(f) => Constructor::Fallible(Arc::clone(f)),
        }
    }
}

impl<T> fmt::Debug for Constructor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constructor::Function(_) => write!(f, "Constructor::Function"),
            Constructor::Fallible(_) => write!(f, "Constructor::Fallible"),
        }
    }
}
