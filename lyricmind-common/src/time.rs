//! Timestamp utilities

use chrono::{DateTime, Duration as ChronoDuration, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Cutoff timestamp for age-based cache eviction
///
/// Rows created strictly before the returned instant are older than `days`.
pub fn days_ago(days: u32) -> DateTime<Utc> {
    now() - ChronoDuration::days(i64::from(days))
}

/// Convert whole seconds (as found in config files) to a duration
pub fn secs_to_duration(secs: u64) -> std::time::Duration {
    std::time::Duration::from_secs(secs)
}
