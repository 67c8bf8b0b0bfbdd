/// Cached measurement staleness detection.
///
/// A cached snapshot is served as live data only while it is younger than
/// the cache TTL (5 minutes by default). Once stale it must not be shown as
/// live, but it remains usable as last-resort fallback data when a live
/// fetch fails.
///
/// # Clock injection
/// All functions accept a `now: DateTime<Utc>` parameter rather than calling
/// `Utc::now()` internally. This makes staleness purely deterministic in
/// tests without mocking or time manipulation.

use chrono::{DateTime, Duration, Utc};

/// Default freshness window for cached measurements.
pub const DEFAULT_TTL_SECS: i64 = 5 * 60;

// ---------------------------------------------------------------------------
// Staleness check
// ---------------------------------------------------------------------------

/// Age of an entry stored at `stored_at`, relative to `now`.
///
/// Entries stored "in the future" (clock skew between runs) have a negative
/// age and are therefore fresh.
pub fn age_at(stored_at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    now - stored_at
}

/// Returns `true` if an entry stored at `stored_at` is stale at `now`.
///
/// Staleness is inclusive of the TTL:
///   age >= ttl  →  stale
///   age <  ttl  →  fresh
pub fn is_stale_at(stored_at: DateTime<Utc>, ttl: Duration, now: DateTime<Utc>) -> bool {
    age_at(stored_at, now) >= ttl
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
