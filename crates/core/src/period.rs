use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Text date layouts tried in order, day-first before month-first.
pub const DEFAULT_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y", "%m/%d/%Y"];

/// Calendar month used as the grouping key for every monthly aggregate.
/// Serialized as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthBucket {
    year: i32,
    month: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid month bucket: '{0}' (expected YYYY-MM)")]
pub struct MonthBucketError(pub String);

impl MonthBucket {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) && (0..=9999).contains(&year) {
            Some(MonthBucket { year, month })
        } else {
            None
        }
    }

    /// `None` for years outside `0..=9999`, which have no `YYYY-MM` form.
    pub fn from_date(date: NaiveDate) -> Option<Self> {
        Self::new(date.year(), date.month())
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        MonthBucket::from_date(date) == Some(self)
    }
}

impl fmt::Display for MonthBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthBucket {
    type Err = MonthBucketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || MonthBucketError(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(err)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(err());
        }
        let year = year.parse::<i32>().map_err(|_| err())?;
        let month = month.parse::<u32>().map_err(|_| err())?;
        MonthBucket::new(year, month).ok_or_else(err)
    }
}

impl TryFrom<String> for MonthBucket {
    type Error = MonthBucketError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthBucket> for String {
    fn from(value: MonthBucket) -> Self {
        value.to_string()
    }
}

/// Inclusive date range used by the detail-view filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_bucket_from_date_is_zero_padded() {
        assert_eq!(MonthBucket::from_date(date(2024, 1, 31)).unwrap().to_string(), "2024-01");
        assert_eq!(MonthBucket::from_date(date(2023, 12, 1)).unwrap().to_string(), "2023-12");
    }

    #[test]
    fn month_bucket_from_date_outside_four_digit_years() {
        assert_eq!(MonthBucket::from_date(date(10000, 1, 1)), None);
        assert_eq!(MonthBucket::from_date(date(-1, 12, 31)), None);
        assert!(MonthBucket::from_date(date(9999, 12, 31)).is_some());
        assert!(!MonthBucket::new(9999, 12).unwrap().contains(date(10000, 12, 1)));
    }

    #[test]
    fn month_bucket_parse_round_trip() {
        let m: MonthBucket = "2024-03".parse().unwrap();
        assert_eq!(m.year(), 2024);
        assert_eq!(m.month(), 3);
        assert_eq!(m.to_string(), "2024-03");
    }

    #[test]
    fn month_bucket_rejects_bad_input() {
        assert!("2024-13".parse::<MonthBucket>().is_err());
        assert!("2024-1".parse::<MonthBucket>().is_err());
        assert!("24-01".parse::<MonthBucket>().is_err());
        assert!("2024/01".parse::<MonthBucket>().is_err());
        assert!("".parse::<MonthBucket>().is_err());
    }

    #[test]
    fn month_bucket_orders_chronologically() {
        let mut months: Vec<MonthBucket> = ["2024-02", "2023-12", "2024-01"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        months.sort();
        let rendered: Vec<String> = months.iter().map(|m| m.to_string()).collect();
        assert_eq!(rendered, ["2023-12", "2024-01", "2024-02"]);
    }

    #[test]
    fn month_bucket_contains() {
        let m = MonthBucket::new(2024, 2).unwrap();
        assert!(m.contains(date(2024, 2, 29)));
        assert!(!m.contains(date(2024, 3, 1)));
    }

    #[test]
    fn month_bucket_serializes_as_string() {
        let m = MonthBucket::new(2024, 5).unwrap();
        assert_eq!(serde_json::to_string(&m).unwrap(), "\"2024-05\"");
        let back: MonthBucket = serde_json::from_str("\"2024-05\"").unwrap();
        assert_eq!(back, m);
        assert!(serde_json::from_str::<MonthBucket>("\"May 2024\"").is_err());
    }

    #[test]
    fn date_range_contains() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 12, 31));
        assert!(range.contains(date(2024, 6, 15)));
        assert!(range.contains(date(2024, 1, 1))); // inclusive start
        assert!(range.contains(date(2024, 12, 31))); // inclusive end
        assert!(!range.contains(date(2023, 12, 31)));
        assert!(!range.contains(date(2025, 1, 1)));
    }

    #[test]
    fn date_range_display() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 12, 31));
        assert_eq!(range.to_string(), "2024-01-01 to 2024-12-31");
    }
}
