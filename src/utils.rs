// Utility functions
use chrono::NaiveDate;

/// Parses a `YYYY-MM-DD` date, tolerating a trailing time component.
pub fn parse_date(date_str: &str) -> Option<NaiveDate> {
    let trimmed = date_str.trim();
    let day = trimmed.split([' ', 'T']).next().unwrap_or(trimmed);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Rounds to one decimal place, half away from zero.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Median of a non-empty, ascending slice.
pub fn median_sorted(sorted: &[i64]) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) as f64 / 2.0
    } else {
        sorted[mid] as f64
    };
    Some(median)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_timestamped_dates() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 7);
        assert_eq!(parse_date("2024-03-07"), expected);
        assert_eq!(parse_date(" 2024-03-07 00:00:00"), expected);
        assert_eq!(parse_date("2024-03-07T00:00:00Z"), expected);
        assert_eq!(parse_date("03/07/2024"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn round1_keeps_one_decimal() {
        assert_eq!(round1(5.0), 5.0);
        assert_eq!(round1(33.333333), 33.3);
        assert_eq!(round1(66.666666), 66.7);
        assert_eq!(round1(-2.25), -2.3);
    }

    #[test]
    fn median_of_odd_and_even_sets() {
        assert_eq!(median_sorted(&[]), None);
        assert_eq!(median_sorted(&[4]), Some(4.0));
        assert_eq!(median_sorted(&[1, 3, 9]), Some(3.0));
        assert_eq!(median_sorted(&[1, 2, 4, 9]), Some(3.0));
        assert_eq!(median_sorted(&[2, 3]), Some(2.5));
    }
}
