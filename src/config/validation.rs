//! Field-level interpretation of loosely-typed configuration values
//!
//! Each function takes the raw value (if any) and returns either the parsed
//! value or the documented default. A rejected value is logged, never
//! returned as an error.

use std::time::Duration;

/// Parses the maximum depth; negative or non-numeric input yields `default`
pub fn parse_depth(raw: Option<&str>, default: u32) -> u32 {
    parse_or_default(raw, "depth", default, |s| s.parse::<u32>().ok())
}

/// Parses the worker count; zero or non-numeric input yields `default`
pub fn parse_worker_count(raw: Option<&str>, default: usize) -> usize {
    parse_or_default(raw, "workers", default, |s| {
        s.parse::<usize>().ok().filter(|n| *n >= 1)
    })
}

/// Parses the frontier capacity; zero or non-numeric input yields `default`
pub fn parse_capacity(raw: Option<&str>, default: usize) -> usize {
    parse_or_default(raw, "queue-capacity", default, |s| {
        s.parse::<usize>().ok().filter(|n| *n >= 1)
    })
}

/// Parses a delay, where zero is a legitimate value
pub fn parse_delay(raw: Option<&str>, default: Duration) -> Duration {
    parse_or_default(raw, "delay", default, parse_duration)
}

/// Parses an interval that must be strictly positive
pub fn parse_positive_duration(raw: Option<&str>, field: &str, default: Duration) -> Duration {
    parse_or_default(raw, field, default, |s| {
        parse_duration(s).filter(|d| !d.is_zero())
    })
}

fn parse_or_default<T, F>(raw: Option<&str>, field: &str, default: T, parse: F) -> T
where
    T: std::fmt::Debug,
    F: FnOnce(&str) -> Option<T>,
{
    let Some(raw) = raw else {
        return default;
    };

    match parse(raw.trim()) {
        Some(value) => value,
        None => {
            tracing::warn!(
                "Invalid value {:?} for {}, falling back to {:?}",
                raw,
                field,
                default
            );
            default
        }
    }
}

/// Parses a human-readable duration
///
/// Accepts `ms`, `s`, `m` and `h` units, decimal values and compound forms
/// such as `1m30s`. A bare integer is read as milliseconds.
///
/// # Examples
///
/// ```
/// use ripple_crawl::config::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("250ms"), Some(Duration::from_millis(250)));
/// assert_eq!(parse_duration("1m30s"), Some(Duration::from_secs(90)));
/// assert_eq!(parse_duration("500"), Some(Duration::from_millis(500)));
/// assert_eq!(parse_duration("soon"), None);
/// ```
pub fn parse_duration(input: &str) -> Option<Duration> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(ms) = s.parse::<u64>() {
        return Some(Duration::from_millis(ms));
    }

    let is_number = |c: char| c.is_ascii_digit() || c == '.';
    let mut total = Duration::ZERO;
    let mut rest = s;

    while !rest.is_empty() {
        let number_end = rest.find(|c: char| !is_number(c)).unwrap_or(rest.len());
        if number_end == 0 {
            return None;
        }
        let value: f64 = rest[..number_end].parse().ok()?;
        rest = &rest[number_end..];

        let unit_end = rest.find(is_number).unwrap_or(rest.len());
        let seconds = match &rest[..unit_end] {
            "ms" => value / 1000.0,
            "s" => value,
            "m" => value * 60.0,
            "h" => value * 3600.0,
            _ => return None,
        };
        rest = &rest[unit_end..];

        total += Duration::try_from_secs_f64(seconds).ok()?;
    }

    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_parses_integer() {
        assert_eq!(parse_depth(Some("5"), 2), 5);
        assert_eq!(parse_depth(Some(" 0 "), 2), 0);
    }

    #[test]
    fn test_depth_falls_back() {
        assert_eq!(parse_depth(Some("not-a-number"), 2), 2);
        assert_eq!(parse_depth(Some("-1"), 2), 2);
        assert_eq!(parse_depth(Some(""), 2), 2);
        assert_eq!(parse_depth(None, 2), 2);
    }

    #[test]
    fn test_worker_count_rejects_zero() {
        assert_eq!(parse_worker_count(Some("0"), 4), 4);
        assert_eq!(parse_worker_count(Some("8"), 4), 8);
        assert_eq!(parse_worker_count(Some("many"), 4), 4);
    }

    #[test]
    fn test_capacity_rejects_zero() {
        assert_eq!(parse_capacity(Some("0"), 1000), 1000);
        assert_eq!(parse_capacity(Some("64"), 1000), 64);
    }

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("0"), Some(Duration::ZERO));
        assert_eq!(parse_duration("0s"), Some(Duration::ZERO));
        assert_eq!(parse_duration("2s"), Some(Duration::from_secs(2)));
        assert_eq!(parse_duration("1.5s"), Some(Duration::from_millis(1500)));
        assert_eq!(parse_duration("3m"), Some(Duration::from_secs(180)));
        assert_eq!(parse_duration("1h"), Some(Duration::from_secs(3600)));
        assert_eq!(parse_duration("1h2m3s"), Some(Duration::from_secs(3723)));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("s"), None);
        assert_eq!(parse_duration("10 parsecs"), None);
        assert_eq!(parse_duration("1.2.3s"), None);
        assert_eq!(parse_duration("-5s"), None);
    }

    #[test]
    fn test_delay_allows_zero_but_interval_does_not() {
        assert_eq!(parse_delay(Some("0"), Duration::from_secs(1)), Duration::ZERO);
        assert_eq!(
            parse_positive_duration(Some("0"), "timeout", Duration::from_secs(30)),
            Duration::from_secs(30)
        );
    }
}
