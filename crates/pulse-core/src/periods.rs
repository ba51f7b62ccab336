//! Period bucketing helpers
//!
//! Charts label each measurement by its display bucket: day of month,
//! week number within the selected range, or calendar month. The label is
//! derived from the date on demand; nothing period-shaped is stored.

use chrono::{Datelike, NaiveDate};

use crate::models::TimePeriod;

/// Display label for a date within a filter range
///
/// Week numbers count from `range_start`: the first seven days are `WK1`,
/// the next seven `WK2`, and so on.
pub fn period_label(date: NaiveDate, period: TimePeriod, range_start: NaiveDate) -> String {
    match period {
        TimePeriod::Daily => format!("D{:02}", date.day()),
        TimePeriod::Weekly => {
            let days = (date - range_start).num_days();
            format!("WK{}", days.div_euclid(7) + 1)
        }
        TimePeriod::Monthly => format!("{:04}-{:02}", date.year(), date.month()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_daily_label() {
        assert_eq!(
            period_label(ymd(2025, 1, 5), TimePeriod::Daily, ymd(2025, 1, 1)),
            "D05"
        );
    }

    #[test]
    fn test_weekly_label_counts_from_range_start() {
        let start = ymd(2025, 1, 1);
        assert_eq!(period_label(start, TimePeriod::Weekly, start), "WK1");
        assert_eq!(
            period_label(ymd(2025, 1, 7), TimePeriod::Weekly, start),
            "WK1"
        );
        assert_eq!(
            period_label(ymd(2025, 1, 8), TimePeriod::Weekly, start),
            "WK2"
        );
        assert_eq!(
            period_label(ymd(2025, 2, 5), TimePeriod::Weekly, start),
            "WK6"
        );
    }

    #[test]
    fn test_monthly_label() {
        assert_eq!(
            period_label(ymd(2025, 3, 15), TimePeriod::Monthly, ymd(2025, 1, 1)),
            "2025-03"
        );
    }
}
