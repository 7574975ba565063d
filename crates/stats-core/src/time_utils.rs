use chrono::{Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::window::last_of_month;

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

/// Resolve a timezone name, `"auto"` meaning the system timezone.
///
/// Unknown names fall back to UTC with a warning.
pub fn resolve_timezone(tz_name: &str) -> Tz {
    let name = if tz_name.eq_ignore_ascii_case("auto") {
        get_system_timezone()
    } else {
        tz_name.to_string()
    };
    name.parse::<Tz>().unwrap_or_else(|_| {
        warn!("unrecognised timezone \"{}\", falling back to UTC", name);
        Tz::UTC
    })
}

/// Today's calendar date in `tz_name`.
pub fn today_in(tz_name: &str) -> NaiveDate {
    Utc::now().with_timezone(&resolve_timezone(tz_name)).date_naive()
}

// ── Log date parsing ──────────────────────────────────────────────────────────

/// Parse the leading date token of a log line.
///
/// Only the exact `yyyy-MM-dd` shape is accepted: ten characters, four-digit
/// year, two-digit month (`01`-`12`) and day (`01`-`31`). A day past the end
/// of its month resolves to the month's last day, so `2025-02-30` is
/// 2025-02-28. Returns `None` for anything else.
pub fn parse_log_date(token: &str) -> Option<NaiveDate> {
    let bytes = token.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    let digits_ok = bytes
        .iter()
        .enumerate()
        .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !digits_ok {
        return None;
    }

    let year: i32 = token[0..4].parse().ok()?;
    let month: u32 = token[5..7].parse().ok()?;
    let day: u32 = token[8..10].parse().ok()?;
    if !(1..=31).contains(&day) {
        return None;
    }

    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last_day = last_of_month(first).day();
    first.with_day(day.min(last_day))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_timezone_known() {
        assert_eq!(resolve_timezone("Europe/Berlin"), Tz::Europe__Berlin);
    }

    #[test]
    fn test_resolve_timezone_unknown_falls_back_to_utc() {
        assert_eq!(resolve_timezone("Not/AZone"), Tz::UTC);
    }

    #[test]
    fn test_today_in_utc_matches_chrono() {
        let expected = Utc::now().date_naive();
        let today = today_in("UTC");
        // Allow for a midnight rollover between the two calls.
        assert!(today == expected || today == expected.succ_opt().unwrap());
    }

    #[test]
    fn test_get_system_timezone_returns_nonempty_string() {
        assert!(!get_system_timezone().is_empty());
    }

    #[test]
    fn test_parse_log_date_valid() {
        assert_eq!(
            parse_log_date("2025-03-04"),
            NaiveDate::from_ymd_opt(2025, 3, 4)
        );
    }

    #[test]
    fn test_parse_log_date_rejects_other_shapes() {
        for bad in [
            "2025-3-4",
            "2025/03/04",
            "25-03-04",
            "2025-03-04T10:00:00",
            "+2025-03-4",
            "2025-13-01",
            "2025-00-10",
            "2025-03-00",
            "2025-03-32",
            "",
            "at",
        ] {
            assert!(parse_log_date(bad).is_none(), "{}", bad);
        }
    }

    #[test]
    fn test_parse_log_date_clamps_day_to_month_end() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day);
        assert_eq!(parse_log_date("2025-02-30"), d(2025, 2, 28));
        assert_eq!(parse_log_date("2025-02-31"), d(2025, 2, 28));
        assert_eq!(parse_log_date("2024-02-30"), d(2024, 2, 29));
        assert_eq!(parse_log_date("2025-04-31"), d(2025, 4, 30));
        assert_eq!(parse_log_date("2025-12-31"), d(2025, 12, 31));
    }
}
