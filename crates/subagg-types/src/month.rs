//! Month-granular dates
//!
//! Billing works on whole calendar months. A [`YearMonth`] is a date with the
//! day-of-month normalized to the first, written `MM-YYYY` at the API boundary.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::ValidationError;

/// A calendar month, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth(NaiveDate);

/// Error returned when a string is not a valid `MM-YYYY` month
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("expected MM-YYYY, got {0:?}")]
pub struct ParseYearMonthError(String);

impl YearMonth {
    /// Build a month from its year and 1-based month number
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    /// Truncate a date to its month
    pub fn from_date(date: NaiveDate) -> Self {
        // Day 1 exists in every month chrono can represent.
        Self(date.with_day(1).unwrap_or(date))
    }

    /// Parse `value` as `MM-YYYY`, attributing failures to `field`
    pub fn parse_field(field: &'static str, value: &str) -> Result<Self, ValidationError> {
        value.parse().map_err(|_| ValidationError::InvalidDate {
            field,
            value: value.to_string(),
        })
    }

    /// Year component
    pub fn year(self) -> i32 {
        self.0.year()
    }

    /// Month component, 1 through 12
    pub fn month(self) -> u32 {
        self.0.month()
    }

    /// Months since year zero: `year * 12 + month`
    pub fn ordinal(self) -> i64 {
        i64::from(self.year()) * 12 + i64::from(self.month())
    }

    /// First day of the month, as stored in the database
    pub fn first_day(self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for YearMonth {
    fn from(date: NaiveDate) -> Self {
        Self::from_date(date)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:04}", self.month(), self.year())
    }
}

impl FromStr for YearMonth {
    type Err = ParseYearMonthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseYearMonthError(s.to_string());

        let (month, year) = s.split_once('-').ok_or_else(err)?;
        if month.len() != 2 || year.len() != 4 {
            return Err(err());
        }
        if !month.bytes().chain(year.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(err());
        }

        let month: u32 = month.parse().map_err(|_| err())?;
        let year: i32 = year.parse().map_err(|_| err())?;
        Self::new(year, month).ok_or_else(err)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
