use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

pub(crate) fn get_duration_since_epoch() -> Duration {
    // A clock set before 1970 reads as the epoch.
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}

/// return millisecond, the unit stored in `lastUpdated`
pub fn timestamp_millis() -> i64 {
    get_duration_since_epoch().as_millis() as i64
}
