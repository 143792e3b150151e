//! Staleness policy for cached assets.

/// Default max age: 24 hours, in milliseconds.
pub const DEFAULT_MAX_AGE_MS: u64 = 24 * 60 * 60 * 1000;

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Whether an entry last confirmed at `timestamp_ms` is stale at `now_ms`.
///
/// Stale means strictly older than `max_age_ms`. An entry whose timestamp lies
/// in the future (clock skew) is fresh.
pub fn is_stale(timestamp_ms: i64, now_ms: i64, max_age_ms: u64) -> bool {
    let age = i128::from(now_ms) - i128::from(timestamp_ms);
    age > i128::from(max_age_ms)
}
