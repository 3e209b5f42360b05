use chrono::{DateTime, TimeZone, Timelike};

/// Case-insensitive substring test.
/// `needle` must already be lowercased.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(needle)
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Header greeting for a local hour (0-23)
pub fn greeting_for_hour(hour: u32) -> &'static str {
    if hour < 12 {
        "Good Morning"
    } else if hour < 18 {
        "Good Afternoon"
    } else {
        "Good Evening"
    }
}

pub fn greeting<Tz: TimeZone>(now: &DateTime<Tz>) -> &'static str {
    greeting_for_hour(now.hour())
}

/// Header clock, e.g. "Mon, Oct 19, 09:05 AM"
pub fn format_clock<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format("%a, %b %-d, %I:%M %p").to_string()
}

/// Compact count label: "1 service", "3 services"
pub fn pluralize(count: usize, singular: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}s", count, singular)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Hello", 10), "Hello");
        assert_eq!(truncate("Hello World", 8), "Hello...");
        assert_eq!(truncate("Hi", 2), "Hi");
        assert_eq!(truncate("Jellyfin", 3), "Jel");
    }

    #[test]
    fn test_contains_ignore_case() {
        assert!(contains_ignore_case("Pi-hole", "hole"));
        assert!(contains_ignore_case("DNS sinkhole", "dns"));
        assert!(contains_ignore_case("anything", ""));
        assert!(!contains_ignore_case("Plex", "jelly"));
    }

    #[test]
    fn test_greeting_boundaries() {
        assert_eq!(greeting_for_hour(0), "Good Morning");
        assert_eq!(greeting_for_hour(11), "Good Morning");
        assert_eq!(greeting_for_hour(12), "Good Afternoon");
        assert_eq!(greeting_for_hour(17), "Good Afternoon");
        assert_eq!(greeting_for_hour(18), "Good Evening");
        assert_eq!(greeting_for_hour(23), "Good Evening");
    }

    #[test]
    fn test_format_clock() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 9, 5, 0).unwrap();
        assert_eq!(format_clock(&now), "Mon, Oct 19, 09:05 AM");
        assert_eq!(greeting(&now), "Good Morning");

        let evening = Utc.with_ymd_and_hms(2026, 10, 19, 21, 30, 0).unwrap();
        assert_eq!(format_clock(&evening), "Mon, Oct 19, 09:30 PM");
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize(1, "service"), "1 service");
        assert_eq!(pluralize(0, "service"), "0 services");
        assert_eq!(pluralize(4, "service"), "4 services");
    }
}
