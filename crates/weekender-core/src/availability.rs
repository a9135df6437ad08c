//! Weekend availability projection.
//!
//! [`project`] turns a venue's booked dates into the list of Friday, Saturday
//! and Sunday records for one calendar year, honouring the venue's lease
//! boundary and never reporting days before "today".

use std::fmt;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::date::{BookedDateSet, DateWindow};

/// How many years past the current one availability may be requested.
pub const MAX_YEARS_AHEAD: i32 = 4;

/// The weekend days a venue is offered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayName {
    Friday,
    Saturday,
    Sunday,
}

impl DayName {
    /// Maps a weekday to a weekend day name, or `None` for Monday to Thursday.
    pub fn from_weekday(weekday: Weekday) -> Option<Self> {
        match weekday {
            Weekday::Fri => Some(Self::Friday),
            Weekday::Sat => Some(Self::Saturday),
            Weekday::Sun => Some(Self::Sunday),
            _ => None,
        }
    }

    /// Returns the lowercase day name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        }
    }
}

impl fmt::Display for DayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Availability of a single weekend day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekendDayRecord {
    /// The calendar date.
    pub date: NaiveDate,
    /// Which weekend day it is.
    #[serde(rename = "day")]
    pub day_name: DayName,
    /// Whether the venue is free on this date.
    pub available: bool,
}

/// The span of years availability may be requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    /// The current year.
    pub min: i32,
    /// The furthest year, limited by the lease boundary if there is one.
    pub max: i32,
}

impl YearRange {
    /// Computes `[today.year, min(today.year + 4, lease_end.year)]`.
    pub fn for_venue(today: NaiveDate, lease_end: Option<NaiveDate>) -> Self {
        let min = today.year();
        let mut max = min + MAX_YEARS_AHEAD;
        if let Some(lease_end) = lease_end {
            max = max.min(lease_end.year());
        }
        Self { min, max }
    }

    /// Returns true if the year may be requested.
    pub fn contains(&self, year: i32) -> bool {
        self.min <= year && year <= self.max
    }
}

/// Computes the dates [`project`] walks for a year.
///
/// The window starts on January 1st, or on `today` for the current year, and
/// ends on December 31st or the lease boundary, whichever is earlier.
/// Returns `None` when nothing is left to scan.
pub fn scan_window(year: i32, today: NaiveDate, lease_end: Option<NaiveDate>) -> Option<DateWindow> {
    let mut window = DateWindow::for_year(year)?;
    if year == today.year() {
        window = window.starting_no_earlier_than(today);
    }
    if let Some(lease_end) = lease_end {
        window = window.ending_no_later_than(lease_end);
    }
    (!window.is_empty()).then_some(window)
}

/// Projects booked dates onto the weekend days of `year`.
///
/// Records come out in ascending date order, one per Friday, Saturday and
/// Sunday in the scan window. The result depends only on the arguments, so
/// the caller is expected to pass one snapshot of the booked dates for the
/// whole walk.
pub fn project(
    year: i32,
    booked: &BookedDateSet,
    lease_end: Option<NaiveDate>,
    today: NaiveDate,
) -> Vec<WeekendDayRecord> {
    let Some(window) = scan_window(year, today, lease_end) else {
        return Vec::new();
    };

    window
        .days()
        .filter_map(|date| {
            DayName::from_weekday(date.weekday()).map(|day_name| WeekendDayRecord {
                date,
                day_name,
                available: !booked.contains(&date),
            })
        })
        .collect()
}
