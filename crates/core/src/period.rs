//! Billing period key (`YYYY-MM`).
//!
//! Settlement entries are matched to the accrual period they pay down through
//! this key, independently of the date they were posted on.

use core::fmt;
use core::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{DomainError, DomainResult};

/// A calendar month, ordered chronologically.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// Build a period, validating the month and a four-digit year.
    pub fn new(year: i32, month: u32) -> DomainResult<Self> {
        if !(1000..=9999).contains(&year) {
            return Err(DomainError::validation(format!(
                "period year out of range: {year}"
            )));
        }
        if !(1..=12).contains(&month) {
            return Err(DomainError::validation(format!(
                "period month out of range: {month}"
            )));
        }
        Ok(Self { year, month })
    }

    /// Period containing the given date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The following calendar month.
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Last calendar day of the period.
    pub fn end_of_month(&self) -> DomainResult<NaiveDate> {
        let next = self.next();
        NaiveDate::from_ymd_opt(next.year, next.month, 1)
            .and_then(|d| d.pred_opt())
            .ok_or_else(|| DomainError::validation(format!("period out of range: {self}")))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |s: &str| -> Option<Period> {
            let (year, month) = s.split_once('-')?;
            if year.len() != 4 || month.len() != 2 {
                return None;
            }
            let year: i32 = year.parse().ok()?;
            let month: u32 = month.parse().ok()?;
            Period::new(year, month).ok()
        };
        parse(s).ok_or_else(|| {
            DomainError::validation(format!("invalid period '{s}', expected YYYY-MM"))
        })
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
