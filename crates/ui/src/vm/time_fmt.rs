/// Viewing time as `"{h}h {m}m"`, or `"{m}m"` under an hour.
#[must_use]
pub fn format_duration(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_drops_hours_below_one_hour() {
        assert_eq!(format_duration(0), "0m");
        assert_eq!(format_duration(59), "0m");
        assert_eq!(format_duration(61), "1m");
        assert_eq!(format_duration(3599), "59m");
    }

    #[test]
    fn duration_shows_hours_and_minutes() {
        assert_eq!(format_duration(3600), "1h 0m");
        assert_eq!(format_duration(2 * 3600 + 5 * 60 + 9), "2h 5m");
    }
}
