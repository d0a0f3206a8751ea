use jiff::Timestamp;

/// Format a past timestamp as a short relative label like "2d ago", "3h ago",
/// "15m ago", or "just now", measured against the current time.
pub fn relative_time(past: Timestamp) -> String {
    relative_time_at(past, Timestamp::now())
}

/// Same as [`relative_time`] against an explicit `now`.
///
/// Timestamps in the future (clock skew between us and the outlet) are shown
/// as "just now".
pub fn relative_time_at(past: Timestamp, now: Timestamp) -> String {
    let elapsed_secs = now.duration_since(past).as_secs();
    if elapsed_secs <= 0 {
        return "just now".to_string();
    }

    let minutes = elapsed_secs / 60;
    if minutes < 1 {
        return "just now".to_string();
    }
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }

    let hours = elapsed_secs / 3_600;
    if hours < 24 {
        return format!("{}h ago", hours);
    }

    format!("{}d ago", elapsed_secs / 86_400)
}
