// Wall-clock timestamps in integer milliseconds since the Unix epoch.

/// Current time in milliseconds since the Unix epoch.
pub fn now_in_milli() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
