//! Process-wide descriptor cache
//!
//! Descriptors are built once per type on first use and shared for the
//! lifetime of the process. The cache is a concurrent map keyed by
//! `TypeId`; a descriptor is built outside any lock and the first insert
//! wins, so concurrent first uses may build twice but all callers end up
//! with the same `Arc`. Failed builds are not cached.

use std::any::{Any, TypeId};
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use recmap_core::{Error, Result};
use tracing::{debug, warn};

use crate::descriptor::{Descriptor, Entity};

// =============================================================================
// Global Descriptor Registry
// =============================================================================

/// Built descriptors (TypeId -> Arc<Descriptor<T>>)
static DESCRIPTORS: Lazy<DashMap<TypeId, Arc<dyn Any + Send + Sync>>> = Lazy::new(DashMap::new);

/// Get the descriptor of `T`, building and caching it on first use
///
/// # Errors
///
/// Returns `Error::Mapping` when `T`'s registration is invalid. The error
/// is returned again on every call; nothing is cached for `T`.
pub fn descriptor<T: Entity>() -> Result<Arc<Descriptor<T>>> {
    let id = TypeId::of::<T>();
    if let Some(cached) = DESCRIPTORS.get(&id) {
        let cached = Arc::clone(cached.value());
        return downcast::<T>(cached);
    }

    let built = match Descriptor::<T>::build() {
        Ok(descriptor) => descriptor,
        Err(e) => {
            warn!(target: "recmap::mapper", type_name = std::any::type_name::<T>(), error = %e, "Rejected mapped type");
            return Err(e);
        }
    };
    debug!(
        target: "recmap::mapper",
        type_name = built.type_name(),
        set = built.set_name(),
        fields = built.fields().len(),
        "Registered descriptor"
    );

    let erased: Arc<dyn Any + Send + Sync> = Arc::new(built);
    let winner = Arc::clone(DESCRIPTORS.entry(id).or_insert(erased).value());
    downcast::<T>(winner)
}

/// Check whether `T`'s descriptor has been built
pub fn is_registered<T: Entity>() -> bool {
    DESCRIPTORS.contains_key(&TypeId::of::<T>())
}

/// Number of cached descriptors
pub fn registered_count() -> usize {
    DESCRIPTORS.len()
}

fn downcast<T: Entity>(erased: Arc<dyn Any + Send + Sync>) -> Result<Arc<Descriptor<T>>> {
    erased.downcast::<Descriptor<T>>().map_err(|_| {
        Error::mapping(
            std::any::type_name::<T>(),
            "descriptor cache entry has the wrong type",
        )
    })
}
