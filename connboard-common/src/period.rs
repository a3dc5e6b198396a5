//! Rotation periods and month boundaries
//!
//! A rotation period is one calendar month. Calendar math is done on the
//! local date of the clock's offset, so "today" and "this month" match what
//! the community sees.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime};
use serde::Serialize;

use crate::{Error, Result};

/// One leaderboard cycle, identified by (year, month)
///
/// Months are 1-based. Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RotationPeriod {
    year: i32,
    month: u32,
}

impl RotationPeriod {
    /// Create a period, rejecting months outside 1..=12
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidInput(format!("month out of range: {}", month)));
        }
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(Error::InvalidInput(format!("year out of range: {}", year)));
        }
        Ok(Self { year, month })
    }

    /// Period containing a calendar date
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Period containing an instant, using the instant's own offset
    pub fn at(instant: &DateTime<FixedOffset>) -> Self {
        Self::containing(instant.date_naive())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn next(self) -> Self {
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

    pub fn previous(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).expect("period holds a valid month")
    }

    /// First instant of this period in the given offset
    pub fn start_in(&self, offset: FixedOffset) -> DateTime<FixedOffset> {
        let local = self.first_day().and_time(NaiveTime::MIN);
        let utc = local - Duration::seconds(i64::from(offset.local_minus_utc()));
        DateTime::from_naive_utc_and_offset(utc, offset)
    }
}

impl fmt::Display for RotationPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// First instant of the calendar month after `now`
///
/// Always strictly later than `now`, so a boundary that has already passed is
/// never returned again.
pub fn next_boundary(now: &DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    RotationPeriod::at(now).next().start_in(*now.offset())
}
