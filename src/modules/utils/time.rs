use chrono::{DateTime, Local, Utc};

/// Format a UTC instant as a readable date
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Format duration in seconds to human readable string
pub fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{} seconds", seconds)
    } else if seconds < 3600 {
        format!("{} minutes", seconds / 60)
    } else if seconds < 86400 {
        format!("{} hours", seconds / 3600)
    } else {
        format!("{} days", seconds / 86400)
    }
}

/// Convert a UTC instant to a local time string
pub fn utc_to_local(instant: DateTime<Utc>) -> String {
    let local_time: DateTime<Local> = DateTime::from(instant);
    local_time.format("%Y-%m-%d %H:%M:%S %Z").to_string()
}
