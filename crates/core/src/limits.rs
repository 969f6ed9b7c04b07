//! Store limits and TTL constants
//!
//! These constants describe the store the mapper talks to. They are enforced
//! at descriptor build time (names) and by the expiration converter (TTLs),
//! so violations are reported before any store call.

/// Start of the store's expiration clock: 2010-01-01T00:00:00Z in Unix seconds
///
/// Record void times are seconds since this instant.
pub const STORE_EPOCH_SECS: i64 = 1_262_304_000;

/// The store epoch in Unix milliseconds
///
/// No legitimate absolute expiration can be smaller than this. A smaller
/// positive value is a relative duration written into an absolute field.
pub const STORE_EPOCH_MILLIS: i64 = STORE_EPOCH_SECS * 1_000;

/// Largest relative TTL the store accepts by default (ten years)
pub const DEFAULT_MAX_TTL_SECS: i64 = 315_360_000;

/// Store-side TTL sentinel: the record never expires
pub const TTL_NEVER_EXPIRE: i64 = -1;

/// Store-side TTL sentinel: apply the namespace default TTL
pub const TTL_NAMESPACE_DEFAULT: i64 = 0;

/// Maximum bin name length in bytes
pub const MAX_BIN_NAME_LEN: usize = 15;

/// Maximum set name length in bytes
pub const MAX_SET_NAME_LEN: usize = 63;

/// Maximum namespace name length in bytes
pub const MAX_NAMESPACE_LEN: usize = 31;

/// Convert a Unix timestamp in seconds to a store void time
///
/// Returns 0 (never) for instants at or before the store epoch and saturates
/// at `u32::MAX`.
pub fn unix_secs_to_void_time(unix_secs: i64) -> u32 {
    let since_epoch = unix_secs - STORE_EPOCH_SECS;
    if since_epoch <= 0 {
        0
    } else {
        u32::try_from(since_epoch).unwrap_or(u32::MAX)
    }
}

/// Convert a Unix timestamp in milliseconds to a store void time
///
/// Partial seconds round up, so the void time never falls before the instant.
pub fn unix_millis_to_void_time(unix_millis: i64) -> u32 {
    let secs = unix_millis.div_euclid(1_000);
    let partial = i64::from(unix_millis.rem_euclid(1_000) != 0);
    unix_secs_to_void_time(secs.saturating_add(partial))
}

/// Convert a store void time back to Unix seconds
///
/// Returns `None` for void time 0 (never expires).
pub fn void_time_to_unix_secs(void_time: u32) -> Option<i64> {
    if void_time == 0 {
        None
    } else {
        Some(STORE_EPOCH_SECS + void_time as i64)
    }
}
