use std::time::SystemTime;

use chrono::{DateTime, Local};

/// Converts a filesystem timestamp into local time, if the platform reported one.
#[allow(clippy::cast_possible_wrap)]
#[must_use]
pub fn system_time_to_local(time: std::io::Result<SystemTime>) -> Option<DateTime<Local>> {
    time.ok().and_then(|t| {
        t.duration_since(SystemTime::UNIX_EPOCH)
            .ok()
            .and_then(|d| DateTime::from_timestamp(d.as_secs() as i64, d.subsec_nanos()))
            .map(|dt| dt.with_timezone(&Local))
    })
}
