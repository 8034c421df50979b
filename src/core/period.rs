use chrono::{Datelike, Local, NaiveDate};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PeriodError {
    #[error("month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),
    #[error("invalid billing period '{0}', expected YYYY-MM")]
    InvalidFormat(String),
    #[error("billing period is outside the supported calendar range")]
    OutOfRange,
}

/// A calendar month for which a bill is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BillingPeriod {
    year: i32,
    month: u32,
}

impl BillingPeriod {
    pub fn new(year: i32, month: u32) -> Result<Self, PeriodError> {
        if !(1..=12).contains(&month) {
            return Err(PeriodError::InvalidMonth(month));
        }
        Ok(BillingPeriod { year, month })
    }

    /// Billing period containing the given date
    pub fn from_date(date: NaiveDate) -> Self {
        BillingPeriod {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Billing period of today's date on the local clock
    pub fn current() -> Self {
        Self::from_date(Local::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Move by `delta` calendar months, wrapping across year boundaries.
    pub fn offset(&self, delta: i32) -> Result<Self, PeriodError> {
        let index = self.month_index() + i64::from(delta);
        let year = i32::try_from(index.div_euclid(12)).map_err(|_| PeriodError::OutOfRange)?;
        let month = u32::try_from(index.rem_euclid(12) + 1).map_err(|_| PeriodError::OutOfRange)?;
        Ok(BillingPeriod { year, month })
    }

    pub fn next(&self) -> Result<Self, PeriodError> {
        self.offset(1)
    }

    #[allow(dead_code)]
    pub fn previous(&self) -> Result<Self, PeriodError> {
        self.offset(-1)
    }

    /// Signed number of months from `start` to `self`.
    ///
    /// Zero when both are the same month, negative when `start` is later.
    pub fn months_since(&self, start: BillingPeriod) -> i64 {
        self.month_index() - start.month_index()
    }

    /// `count` consecutive periods starting at `self`
    pub fn range(self, count: usize) -> Result<Vec<BillingPeriod>, PeriodError> {
        if let Some(last) = count.checked_sub(1) {
            let last = i32::try_from(last).map_err(|_| PeriodError::OutOfRange)?;
            self.offset(last)?;
        }
        Ok(std::iter::successors(Some(self), |p| p.next().ok())
            .take(count)
            .collect())
    }

    fn month_index(&self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month) - 1
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for BillingPeriod {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PeriodError::InvalidFormat(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        BillingPeriod::new(year, month)
    }
}
