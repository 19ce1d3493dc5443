use anyhow::Context;
use chrono::{Days, NaiveDate};

/// Inclusive number of calendar days between `start` and `end`.
///
/// Returns `None` when `end` precedes `start`.
pub fn trip_length_days(start: NaiveDate, end: NaiveDate) -> Option<u32> {
    let span = end.signed_duration_since(start).num_days();
    if span < 0 {
        return None;
    }
    u32::try_from(span + 1).ok()
}

/// Calendar date of the day at `offset` (0-based) from `start`.
pub fn day_date(start: NaiveDate, offset: usize) -> NaiveDate {
    start
        .checked_add_days(Days::new(offset as u64))
        .unwrap_or(NaiveDate::MAX)
}

pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    let s = s.trim();
    // Accept full ISO timestamps from browser clients and keep only the date part.
    let date_part = s.split('T').next().unwrap_or(s);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .with_context(|| format!("invalid date (expected YYYY-MM-DD): {s}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn single_day_trip_has_length_one() {
        assert_eq!(trip_length_days(d(2026, 3, 1), d(2026, 3, 1)), Some(1));
    }

    #[test]
    fn length_is_inclusive_across_month_boundary() {
        assert_eq!(trip_length_days(d(2026, 1, 30), d(2026, 2, 2)), Some(4));
    }

    #[test]
    fn end_before_start_has_no_length() {
        assert_eq!(trip_length_days(d(2026, 3, 2), d(2026, 3, 1)), None);
    }

    #[test]
    fn day_dates_follow_offsets() {
        let start = d(2026, 2, 27);
        assert_eq!(day_date(start, 0), start);
        assert_eq!(day_date(start, 2), d(2026, 3, 1));
    }

    #[test]
    fn parses_plain_and_timestamped_dates() {
        assert_eq!(parse_date("2026-05-04").unwrap(), d(2026, 5, 4));
        assert_eq!(
            parse_date("2026-05-04T00:00:00.000Z").unwrap(),
            d(2026, 5, 4)
        );
        assert!(parse_date("04/05/2026").is_err());
    }
}
