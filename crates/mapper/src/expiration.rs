//! Expiration conversion
//!
//! Objects always carry an absolute expiration in Unix milliseconds, or `-1`
//! for "never". The store speaks relative seconds: `-1` never, `0` namespace
//! default, positive values counted from the moment of the write.
//!
//! Converting object → store subtracts "now" at write time and rounds the
//! remainder up to whole seconds. Reading back reports the record's void
//! time, which is never earlier than the value written and at most two
//! seconds later. `to_object_time` converts a bare relative TTL the same way
//! in the other direction.
//!
//! A relative duration handed over as if it were absolute would be read by
//! the store as an enormous TTL. `to_store_time` rejects anything smaller
//! than the store epoch for that reason.

use recmap_core::limits::{
    DEFAULT_MAX_TTL_SECS, STORE_EPOCH_MILLIS, TTL_NAMESPACE_DEFAULT, TTL_NEVER_EXPIRE,
};
use recmap_core::{Record, Timestamp};
use thiserror::Error;

/// An object expiration that cannot be sent to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExpirationError {
    /// Negative value other than the never-expire sentinel
    #[error("negative expiration {0} (only -1 means never)")]
    Negative(i64),

    /// Positive value too small to be an absolute timestamp
    #[error("expiration {0} looks like a relative duration, expected absolute epoch milliseconds")]
    LooksRelative(i64),

    /// Absolute timestamp at or before now
    #[error("expiration {expires_at} is not after now ({now})")]
    InPast {
        /// Requested expiration (ms)
        expires_at: i64,
        /// Current time (ms)
        now: i64,
    },

    /// TTL longer than the store accepts
    #[error("expiration is {ttl_secs}s away, store maximum is {max_secs}s")]
    TooFar {
        /// Resulting TTL (seconds)
        ttl_secs: i64,
        /// Largest TTL accepted
        max_secs: i64,
    },
}

/// Convert a TTL reported by the store into an absolute object expiration
///
/// `-1` (never) and `0` map to `-1`; positive seconds become `now + ttl`.
pub fn to_object_time(store_ttl_secs: i64, now: Timestamp) -> i64 {
    if store_ttl_secs <= 0 {
        return TTL_NEVER_EXPIRE;
    }
    now.saturating_add_millis(store_ttl_secs.saturating_mul(1_000))
        .as_millis()
}

/// Absolute object expiration of a stored record
///
/// Taken from the record's void time, so it does not depend on when it is
/// read. Records that never expire report `-1`.
pub fn record_expiration(record: &Record) -> i64 {
    record
        .expires_at()
        .map_or(TTL_NEVER_EXPIRE, |expires_at| expires_at.as_millis())
}

/// Convert an absolute object expiration into a store TTL
///
/// `-1` stays `-1` and `0` stays `0` (namespace default). Positive values
/// become the number of whole seconds until `expires_at`, rounded up.
///
/// # Errors
///
/// - `Negative` for negatives other than `-1`
/// - `LooksRelative` for values below the store epoch
/// - `InPast` for values at or before `now`
/// - `TooFar` when the TTL exceeds `DEFAULT_MAX_TTL_SECS`
pub fn to_store_time(expires_at: i64, now: Timestamp) -> Result<i64, ExpirationError> {
    match expires_at {
        TTL_NEVER_EXPIRE => return Ok(TTL_NEVER_EXPIRE),
        TTL_NAMESPACE_DEFAULT => return Ok(TTL_NAMESPACE_DEFAULT),
        v if v < 0 => return Err(ExpirationError::Negative(v)),
        v if v < STORE_EPOCH_MILLIS => return Err(ExpirationError::LooksRelative(v)),
        _ => {}
    }

    let now = now.as_millis();
    if expires_at <= now {
        return Err(ExpirationError::InPast { expires_at, now });
    }

    let remaining = expires_at - now;
    let ttl_secs = remaining / 1_000 + i64::from(remaining % 1_000 != 0);
    if ttl_secs > DEFAULT_MAX_TTL_SECS {
        return Err(ExpirationError::TooFar {
            ttl_secs,
            max_secs: DEFAULT_MAX_TTL_SECS,
        });
    }
    Ok(ttl_secs)
}
