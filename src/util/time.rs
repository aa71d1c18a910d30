//! Clock helpers for record timestamps

use chrono::Utc;

/// Current wall-clock time as milliseconds since the Unix epoch.
///
/// All persisted timestamps (`started_at`, `last_updated_at`,
/// `answered_at`, ...) use this resolution.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
