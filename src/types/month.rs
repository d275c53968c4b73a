use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};

/// A calendar month, ordered chronologically (year first, then month number 1-12).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Month(pub i32, pub u32);

impl Month {
    pub fn new(month: u32, year: i32) -> Self {
        Self(year, month)
    }

    pub fn year(self) -> i32 {
        self.0
    }

    pub fn month(self) -> u32 {
        self.1
    }

    /// The month containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.year(), date.month())
    }

    /// The month directly after this one, rolling over into January of the next year.
    pub fn succ(self) -> Self {
        if self.1 >= 12 {
            Self(self.0 + 1, 1)
        } else {
            Self(self.0, self.1 + 1)
        }
    }

    /// Number of days in this month, or `None` when the month number is out of range.
    pub fn days_in_month(self) -> Option<u32> {
        if !(1..=12).contains(&self.1) {
            return None;
        }
        let next = self.succ();
        let first_of_next = NaiveDate::from_ymd_opt(next.0, next.1, 1)?;
        Some((first_of_next - Duration::days(1)).day())
    }

    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.0, self.1, 1)
    }
}

impl Display for Month {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.0, self.1)
    }
}

impl From<NaiveDate> for Month {
    fn from(date: NaiveDate) -> Self {
        Month::from_date(date)
    }
}
