//! Calendar date value type
//!
//! A validated year-month-day date used for deadlines. Backed by
//! [`chrono::NaiveDate`], so arithmetic crosses month, year and leap-year
//! boundaries correctly. Serialized as `YYYY-MM-DD`.
//!
//! [`Date::today`] is the only place that reads the system clock; everything
//! date-dependent elsewhere takes a reference date as an argument.

use chrono::{Datelike, Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::TodoError;

const WIRE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Date(NaiveDate);

impl Date {
    /// Creates a date, failing if it is not a real calendar date
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self, TodoError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| {
                TodoError::validation(format!("invalid date: {:04}-{:02}-{:02}", year, month, day))
            })
    }

    /// Returns the current local date
    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    pub fn from_naive(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// Returns the date `days` later (or earlier, for negative values)
    pub fn add_days(&self, days: i64) -> Result<Self, TodoError> {
        let shifted = if days >= 0 {
            self.0.checked_add_days(Days::new(days.unsigned_abs()))
        } else {
            self.0.checked_sub_days(Days::new(days.unsigned_abs()))
        };
        shifted
            .map(Self)
            .ok_or_else(|| TodoError::validation(format!("date out of range: {} + {} days", self, days)))
    }

    /// Returns the date `days` earlier (or later, for negative values)
    pub fn subtract_days(&self, days: i64) -> Result<Self, TodoError> {
        let negated = days
            .checked_neg()
            .ok_or_else(|| TodoError::validation(format!("day offset out of range: {}", days)))?;
        self.add_days(negated)
    }

    /// Signed number of days from `self` to `other`
    pub fn days_until(&self, other: &Date) -> i64 {
        (other.0 - self.0).num_days()
    }

    /// True iff this date lies strictly before `reference`
    pub fn is_overdue(&self, reference: &Date) -> bool {
        self < reference
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0.format(WIRE_FORMAT).to_string())
    }
}

impl FromStr for Date {
    type Err = TodoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), WIRE_FORMAT)
            .map(Self)
            .map_err(|e| TodoError::validation(format!("invalid date '{}': {}", s, e)))
    }
}

impl TryFrom<String> for Date {
    type Error = TodoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Date> for String {
    fn from(date: Date) -> Self {
        date.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cmp::Ordering;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::new(y, m, d).unwrap()
    }

    #[test]
    fn rejects_impossible_dates() {
        assert!(Date::new(2025, 13, 1).is_err());
        assert!(Date::new(2025, 0, 1).is_err());
        assert!(Date::new(2025, 4, 31).is_err());
        assert!(Date::new(2025, 2, 29).is_err());
        assert!(Date::new(1900, 2, 29).is_err());

        assert!(Date::new(2024, 2, 29).is_ok());
        assert!(Date::new(2000, 2, 29).is_ok());
    }

    #[test]
    fn invalid_date_is_a_validation_error() {
        assert!(matches!(Date::new(2025, 2, 30), Err(TodoError::Validation(_))));
    }

    #[test]
    fn total_order_by_year_month_day() {
        assert_eq!(date(2024, 12, 31).cmp(&date(2025, 1, 1)), Ordering::Less);
        assert_eq!(date(2025, 3, 5).cmp(&date(2025, 2, 28)), Ordering::Greater);
        assert_eq!(date(2025, 3, 5).cmp(&date(2025, 3, 5)), Ordering::Equal);
    }

    #[test]
    fn arithmetic_crosses_boundaries() {
        assert_eq!(date(2024, 2, 28).add_days(1).unwrap(), date(2024, 2, 29));
        assert_eq!(date(2025, 2, 28).add_days(1).unwrap(), date(2025, 3, 1));
        assert_eq!(date(2025, 12, 31).add_days(1).unwrap(), date(2026, 1, 1));
        assert_eq!(date(2024, 3, 5).add_days(10).unwrap(), date(2024, 3, 15));
        assert_eq!(date(2025, 1, 1).subtract_days(1).unwrap(), date(2024, 12, 31));
        assert_eq!(date(2024, 3, 1).subtract_days(1).unwrap(), date(2024, 2, 29));
        assert_eq!(date(2025, 1, 10).add_days(-10).unwrap(), date(2024, 12, 31));
    }

    #[test]
    fn arithmetic_out_of_range_fails() {
        let max = Date::from_naive(NaiveDate::MAX);
        assert!(max.add_days(1).is_err());
        assert!(date(2025, 1, 1).subtract_days(i64::MIN).is_err());
    }

    #[test]
    fn days_until_is_signed() {
        assert_eq!(date(2024, 3, 5).days_until(&date(2025, 1, 7)), 308);
        assert_eq!(date(2025, 1, 7).days_until(&date(2024, 3, 5)), -308);
    }

    #[test]
    fn overdue_is_strictly_before() {
        let reference = date(2025, 10, 7);
        assert!(date(2025, 10, 6).is_overdue(&reference));
        assert!(!date(2025, 10, 7).is_overdue(&reference));
        assert!(!date(2025, 10, 8).is_overdue(&reference));
    }

    #[test]
    fn parse_and_display_iso() {
        let d: Date = "2025-12-25".parse().unwrap();
        assert_eq!(d, date(2025, 12, 25));
        assert_eq!(d.to_string(), "2025-12-25");
        assert_eq!(date(7, 1, 2).to_string(), "0007-01-02");

        assert!("12-25-2025".parse::<Date>().is_err());
        assert!("2025-02-30".parse::<Date>().is_err());
    }

    #[test]
    fn serde_as_iso_string() {
        let d = date(2025, 3, 9);
        assert_eq!(serde_json::to_string(&d).unwrap(), "\"2025-03-09\"");
        assert_eq!(serde_json::from_str::<Date>("\"2025-03-09\"").unwrap(), d);
        assert!(serde_json::from_str::<Date>("\"2025-13-09\"").is_err());
    }

    proptest! {
        #[test]
        fn add_then_subtract_is_identity(days_from_epoch in -200_000i64..200_000, n in -100_000i64..100_000) {
            let base = date(2000, 1, 1).add_days(days_from_epoch).unwrap();
            let shifted = base.add_days(n).unwrap();
            prop_assert_eq!(shifted.subtract_days(n).unwrap(), base);
            prop_assert_eq!(base.days_until(&shifted), n);
        }

        #[test]
        fn adding_days_preserves_order(days_from_epoch in -200_000i64..200_000, n in 1i64..10_000) {
            let base = date(2000, 1, 1).add_days(days_from_epoch).unwrap();
            prop_assert!(base < base.add_days(n).unwrap());
            prop_assert!(base > base.subtract_days(n).unwrap());
        }

        #[test]
        fn display_parse_roundtrip(y in 1i32..9999, m in 1u32..=12, d in 1u32..=31) {
            if let Ok(valid) = Date::new(y, m, d) {
                let parsed: Date = valid.to_string().parse().unwrap();
                prop_assert_eq!(parsed, valid);
                prop_assert_eq!((parsed.year(), parsed.month(), parsed.day()), (y, m, d));
            }
        }
    }
}
