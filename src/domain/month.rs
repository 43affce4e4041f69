//! Calendar-month identifier used to scope plans and transaction indexes.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::BudgetError;

/// A validated `YYYY-MM` month identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Month(String);

impl Month {
    pub fn new(year: i32, month: u32) -> Result<Self, BudgetError> {
        if !(1..=12).contains(&month) || !(0..=9999).contains(&year) {
            return Err(BudgetError::InvalidMonth(format!("{year:04}-{month:02}")));
        }
        Ok(Self(format!("{year:04}-{month:02}")))
    }

    /// Month containing the given date.
    pub fn of_date(date: NaiveDate) -> Self {
        Self(format!("{:04}-{:02}", date.year(), date.month()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First calendar day of the month.
    pub fn first_day(&self) -> NaiveDate {
        let (year, month) = self.parts();
        NaiveDate::from_ymd_opt(year, month, 1).unwrap_or_default()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        let (year, month) = self.parts();
        date.year() == year && date.month() == month
    }

    /// ISO date-string bounds for filtering a month's transactions:
    /// inclusive `{month}-01` and exclusive `{month}-32`. Day 32 never
    /// exists, so the upper bound is safe for every month length under
    /// lexicographic comparison.
    pub fn date_bounds(&self) -> (String, String) {
        (format!("{}-01", self.0), format!("{}-32", self.0))
    }

    fn parts(&self) -> (i32, u32) {
        let year = self.0[..4].parse().unwrap_or(0);
        let month = self.0[5..].parse().unwrap_or(1);
        (year, month)
    }
}

impl FromStr for Month {
    type Err = BudgetError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || BudgetError::InvalidMonth(value.to_string());
        let (year, month) = value.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

impl TryFrom<String> for Month {
    type Error = BudgetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Month> for String {
    fn from(month: Month) -> Self {
        month.0
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_month() {
        let month: Month = "2025-08".parse().expect("valid month");
        assert_eq!(month.as_str(), "2025-08");
        assert_eq!(month.first_day(), NaiveDate::from_ymd_opt(2025, 8, 1).unwrap());
    }

    #[test]
    fn rejects_malformed_strings() {
        for raw in ["2025", "2025-13", "25-08", "2025-8", "august"] {
            assert!(raw.parse::<Month>().is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn date_bounds_use_exclusive_day_32() {
        let month: Month = "2025-02".parse().expect("valid month");
        let (lo, hi) = month.date_bounds();
        assert_eq!(lo, "2025-02-01");
        assert_eq!(hi, "2025-02-32");
        // Every real February date sorts inside the bounds.
        let last = NaiveDate::from_ymd_opt(2025, 2, 28).unwrap().to_string();
        assert!(last.as_str() >= lo.as_str() && last.as_str() < hi.as_str());
    }

    #[test]
    fn contains_matches_only_own_dates() {
        let month: Month = "2025-08".parse().expect("valid month");
        assert!(month.contains(NaiveDate::from_ymd_opt(2025, 8, 31).unwrap()));
        assert!(!month.contains(NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()));
    }
}
