use chrono::{Datelike, Months, NaiveDate};

use crate::errors::{CalculatorError, Result};

/// Returns the first day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    // Day 1 is valid for every month
    date.with_day(1).unwrap_or(date)
}

/// Canonical "YYYY-MM" key for the month containing `date`.
pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Steps `date` by a signed number of calendar months.
pub fn add_months(date: NaiveDate, months: i32) -> Result<NaiveDate> {
    let stepped = if months >= 0 {
        date.checked_add_months(Months::new(months as u32))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs()))
    };
    stepped.ok_or_else(|| CalculatorError::MonthArithmetic { from: date, months }.into())
}

/// Signed count of calendar months from `from` to `to` (positive when `to` is later).
pub fn month_span(from: NaiveDate, to: NaiveDate) -> i32 {
    (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32
}

/// First-of-month dates for every month between `start` and `end`, inclusive.
pub fn get_months_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    if start > end {
        return Vec::new();
    }
    let mut months = Vec::new();
    let mut current = month_start(start);
    let end = month_start(end);
    while current <= end {
        months.push(current);
        if let Some(next) = current.checked_add_months(Months::new(1)) {
            current = next;
        } else {
            // Should not happen for typical date ranges
            break;
        }
    }
    months
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_start_truncates_to_first_day() {
        assert_eq!(month_start(date(2024, 3, 17)), date(2024, 3, 1));
        assert_eq!(month_start(date(2024, 3, 1)), date(2024, 3, 1));
    }

    #[test]
    fn month_key_is_canonical() {
        assert_eq!(month_key(date(2024, 3, 17)), "2024-03");
        assert_eq!(month_key(date(1999, 12, 31)), "1999-12");
    }

    #[test]
    fn add_months_steps_both_directions() {
        assert_eq!(add_months(date(2024, 1, 31), 1).unwrap(), date(2024, 2, 29));
        assert_eq!(add_months(date(2024, 3, 1), -3).unwrap(), date(2023, 12, 1));
    }

    #[test]
    fn month_span_is_signed() {
        assert_eq!(month_span(date(2024, 1, 15), date(2024, 4, 2)), 3);
        assert_eq!(month_span(date(2024, 4, 2), date(2024, 1, 15)), -3);
        assert_eq!(month_span(date(2023, 11, 1), date(2024, 2, 1)), 3);
    }

    #[test]
    fn months_between_is_inclusive() {
        let months = get_months_between(date(2024, 1, 20), date(2024, 3, 5));
        assert_eq!(
            months,
            vec![date(2024, 1, 1), date(2024, 2, 1), date(2024, 3, 1)]
        );
        assert!(get_months_between(date(2024, 3, 1), date(2024, 1, 1)).is_empty());
    }
}
