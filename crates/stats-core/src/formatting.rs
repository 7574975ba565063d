use chrono::NaiveDate;

use crate::window::ReportMode;

/// Format a bucket for display: `"2025-03-04"` in daily mode, `"2025-03"` in
/// monthly mode.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use stats_core::formatting::format_bucket;
/// use stats_core::window::ReportMode;
///
/// let d = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
/// assert_eq!(format_bucket(d, ReportMode::Daily), "2025-03-04");
/// assert_eq!(format_bucket(d, ReportMode::Monthly), "2025-03");
/// ```
pub fn format_bucket(bucket: NaiveDate, mode: ReportMode) -> String {
    match mode {
        ReportMode::Daily => bucket.format("%Y-%m-%d").to_string(),
        ReportMode::Monthly => bucket.format("%Y-%m").to_string(),
    }
}

/// Format a counter with thousands separators.
///
/// # Examples
///
/// ```
/// use stats_core::formatting::format_count;
///
/// assert_eq!(format_count(7), "7");
/// assert_eq!(format_count(1_234_567), "1,234,567");
/// ```
pub fn format_count(value: u64) -> String {
    group_thousands(&value.to_string())
}

/// Format an elapsed duration in seconds, e.g. `"0.42s"` or `"1m 05s"`.
pub fn format_elapsed(seconds: f64) -> String {
    if seconds < 60.0 {
        return format!("{:.2}s", seconds);
    }
    let total = seconds.round() as u64;
    format!("{}m {:02}s", total / 60, total % 60)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_format_bucket_daily_zero_padded() {
        assert_eq!(format_bucket(date(2025, 1, 5), ReportMode::Daily), "2025-01-05");
    }

    #[test]
    fn test_format_bucket_monthly() {
        assert_eq!(format_bucket(date(2024, 11, 1), ReportMode::Monthly), "2024-11");
    }

    #[test]
    fn test_format_count_small() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
    }

    #[test]
    fn test_format_count_thousands() {
        assert_eq!(format_count(1_000), "1,000");
        assert_eq!(format_count(12_345), "12,345");
    }

    #[test]
    fn test_format_elapsed_seconds() {
        assert_eq!(format_elapsed(0.4215), "0.42s");
    }

    #[test]
    fn test_format_elapsed_minutes() {
        assert_eq!(format_elapsed(65.0), "1m 05s");
    }
}
