use chrono::Duration;

/// `1h 5m`, or `5m` for sessions shorter than an hour. Seconds are dropped.
pub fn format_duration(v: Duration) -> String {
    let hours = v.num_hours();
    let minutes = v.num_minutes() % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Fractional hours as `Xh Ym`. Minutes are rounded, and a full hour of rounding carries over.
pub fn format_hours(hours: f64) -> String {
    let total_minutes = (hours.max(0.) * 60.).round() as i64;
    format!("{}h {}m", total_minutes / 60, total_minutes % 60)
}

/// Running timer display, `HH:MM:SS`.
pub fn format_elapsed(v: Duration) -> String {
    let seconds = v.num_seconds().max(0);
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::minutes(65)), "1h 5m");
        assert_eq!(format_duration(Duration::seconds(5 * 60 + 59)), "5m");
        assert_eq!(format_duration(Duration::zero()), "0m");
    }

    #[test]
    fn test_format_hours_carries_minutes() {
        assert_eq!(format_hours(2.5), "2h 30m");
        assert_eq!(format_hours(0.), "0h 0m");
        assert_eq!(format_hours(1.9999), "2h 0m");
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::seconds(3 * 3600 + 62)), "03:01:02");
        assert_eq!(format_elapsed(Duration::hours(100)), "100:00:00");
    }
}
