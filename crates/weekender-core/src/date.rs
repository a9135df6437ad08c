//! Date types for booking data.
//!
//! This module provides [`DateWindow`] for bounding a fetch to an inclusive
//! range of calendar dates, and [`BookedDateSet`] for the set of dates on
//! which a venue is unavailable.

use std::collections::BTreeSet;
use std::collections::btree_set;

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// An inclusive range of calendar dates, `[from, to]`.
///
/// A window whose `from` is after its `to` is empty and contains no dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateWindow {
    /// First date of the window (inclusive).
    pub from: NaiveDate,
    /// Last date of the window (inclusive).
    pub to: NaiveDate,
}

impl DateWindow {
    /// Creates a new date window.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    /// Creates a window from `today` extending `months` calendar months ahead.
    ///
    /// Month arithmetic clamps to the last day of the target month, so
    /// 2026-01-31 plus one month is 2026-02-28.
    pub fn months_ahead(today: NaiveDate, months: u32) -> Self {
        let to = today
            .checked_add_months(Months::new(months))
            .unwrap_or(NaiveDate::MAX);
        Self::new(today, to)
    }

    /// Creates a window covering a whole calendar year.
    ///
    /// Returns `None` if the year is outside chrono's supported range.
    pub fn for_year(year: i32) -> Option<Self> {
        Some(Self::new(
            NaiveDate::from_ymd_opt(year, 1, 1)?,
            NaiveDate::from_ymd_opt(year, 12, 31)?,
        ))
    }

    /// Returns true if the window contains no dates.
    pub fn is_empty(&self) -> bool {
        self.from > self.to
    }

    /// Checks if a date falls within this window (both ends inclusive).
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    /// Moves the start of the window forward to `date` if it is later.
    pub fn starting_no_earlier_than(self, date: NaiveDate) -> Self {
        Self::new(self.from.max(date), self.to)
    }

    /// Pulls the end of the window back to `date` if it is earlier.
    pub fn ending_no_later_than(self, date: NaiveDate) -> Self {
        Self::new(self.from, self.to.min(date))
    }

    /// Pushes the end of the window out to `date` if it is later.
    pub fn extended_to(self, date: NaiveDate) -> Self {
        Self::new(self.from, self.to.max(date))
    }

    /// Iterates over every date in the window in ascending order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let to = self.to;
        self.from.iter_days().take_while(move |day| *day <= to)
    }
}

/// Returns December 31st of the given year, if representable.
pub fn last_day_of_year(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 12, 31)
}

/// The set of calendar dates on which a venue is booked.
///
/// Built fresh on every fetch cycle; a new set replaces the previous one
/// rather than being merged into it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookedDateSet {
    dates: BTreeSet<NaiveDate>,
}

impl BookedDateSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of booked dates.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Returns true if nothing is booked.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Returns true if the date is booked.
    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.dates.contains(date)
    }

    /// Marks a single date as booked. Returns true if it was not already booked.
    pub fn insert(&mut self, date: NaiveDate) -> bool {
        self.dates.insert(date)
    }

    /// Marks every date of an all-day span as booked.
    ///
    /// The span is half-open, `[start, end)`, matching the all-day event
    /// convention where `end` is the day after the last booked day. Only
    /// dates inside `window` are recorded. Returns the number of dates that
    /// were newly added.
    pub fn insert_span(&mut self, start: NaiveDate, end: NaiveDate, window: &DateWindow) -> usize {
        let first = start.max(window.from);
        let mut added = 0;
        for day in first
            .iter_days()
            .take_while(|day| *day < end && *day <= window.to)
        {
            if self.dates.insert(day) {
                added += 1;
            }
        }
        added
    }

    /// Iterates over the booked dates in ascending order.
    pub fn iter(&self) -> btree_set::Iter<'_, NaiveDate> {
        self.dates.iter()
    }
}

impl FromIterator<NaiveDate> for BookedDateSet {
    fn from_iter<I: IntoIterator<Item = NaiveDate>>(iter: I) -> Self {
        Self {
            dates: iter.into_iter().collect(),
        }
    }
}

impl Extend<NaiveDate> for BookedDateSet {
    fn extend<I: IntoIterator<Item = NaiveDate>>(&mut self, iter: I) {
        self.dates.extend(iter);
    }
}

impl<'a> IntoIterator for &'a BookedDateSet {
    type Item = &'a NaiveDate;
    type IntoIter = btree_set::Iter<'a, NaiveDate>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    mod date_window {
        use super::*;

        #[test]
        fn contains_is_inclusive() {
            let window = DateWindow::new(date(2026, 3, 1), date(2026, 3, 31));

            assert!(window.contains(date(2026, 3, 1)));
            assert!(window.contains(date(2026, 3, 15)));
            assert!(window.contains(date(2026, 3, 31)));

            assert!(!window.contains(date(2026, 2, 28)));
            assert!(!window.contains(date(2026, 4, 1)));
        }

        #[test]
        fn months_ahead_clamps_to_month_end() {
            let window = DateWindow::months_ahead(date(2026, 1, 31), 1);
            assert_eq!(window.from, date(2026, 1, 31));
            assert_eq!(window.to, date(2026, 2, 28));

            let window = DateWindow::months_ahead(date(2026, 10, 16), 48);
            assert_eq!(window.to, date(2030, 10, 16));
        }

        #[test]
        fn inverted_window_is_empty() {
            let window = DateWindow::new(date(2026, 5, 2), date(2026, 5, 1));
            assert!(window.is_empty());
            assert_eq!(window.days().count(), 0);
            assert!(!window.contains(date(2026, 5, 1)));
        }

        #[test]
        fn days_walks_ascending() {
            let window = DateWindow::new(date(2026, 2, 27), date(2026, 3, 2));
            let days: Vec<_> = window.days().collect();
            assert_eq!(
                days,
                vec![
                    date(2026, 2, 27),
                    date(2026, 2, 28),
                    date(2026, 3, 1),
                    date(2026, 3, 2)
                ]
            );
        }

        #[test]
        fn clamping_helpers() {
            let year = DateWindow::for_year(2030).unwrap();
            assert_eq!(year.from, date(2030, 1, 1));
            assert_eq!(year.to, date(2030, 12, 31));

            let clamped = year
                .starting_no_earlier_than(date(2030, 2, 1))
                .ending_no_later_than(date(2030, 3, 31));
            assert_eq!(clamped, DateWindow::new(date(2030, 2, 1), date(2030, 3, 31)));

            // Earlier start / later end leave the window untouched
            let same = clamped
                .starting_no_earlier_than(date(2029, 1, 1))
                .ending_no_later_than(date(2031, 1, 1));
            assert_eq!(same, clamped);

            let extended = clamped.extended_to(date(2030, 12, 31));
            assert_eq!(extended.to, date(2030, 12, 31));
        }

        #[test]
        fn serde_roundtrip() {
            let window = DateWindow::new(date(2026, 1, 1), date(2026, 12, 31));
            let json = serde_json::to_string(&window).unwrap();
            assert_eq!(json, r#"{"from":"2026-01-01","to":"2026-12-31"}"#);
            let parsed: DateWindow = serde_json::from_str(&json).unwrap();
            assert_eq!(window, parsed);
        }
    }

    mod booked_date_set {
        use super::*;

        fn wide_window() -> DateWindow {
            DateWindow::new(date(2000, 1, 1), date(2100, 1, 1))
        }

        #[test]
        fn span_end_is_exclusive() {
            let mut set = BookedDateSet::new();
            let added = set.insert_span(date(2026, 6, 12), date(2026, 6, 14), &wide_window());

            assert_eq!(added, 2);
            assert!(set.contains(&date(2026, 6, 12)));
            assert!(set.contains(&date(2026, 6, 13)));
            assert!(!set.contains(&date(2026, 6, 14)));
        }

        #[test]
        fn span_is_clamped_to_window() {
            let window = DateWindow::new(date(2026, 6, 10), date(2026, 6, 12));
            let mut set = BookedDateSet::new();
            set.insert_span(date(2026, 6, 8), date(2026, 6, 20), &window);

            let dates: Vec<_> = set.iter().copied().collect();
            assert_eq!(
                dates,
                vec![date(2026, 6, 10), date(2026, 6, 11), date(2026, 6, 12)]
            );
        }

        #[test]
        fn empty_or_inverted_span_adds_nothing() {
            let mut set = BookedDateSet::new();
            assert_eq!(
                set.insert_span(date(2026, 6, 12), date(2026, 6, 12), &wide_window()),
                0
            );
            assert_eq!(
                set.insert_span(date(2026, 6, 12), date(2026, 6, 1), &wide_window()),
                0
            );
            assert!(set.is_empty());
        }

        #[test]
        fn overlapping_spans_collapse() {
            let mut set = BookedDateSet::new();
            set.insert_span(date(2026, 7, 1), date(2026, 7, 4), &wide_window());
            let added = set.insert_span(date(2026, 7, 3), date(2026, 7, 5), &wide_window());

            assert_eq!(added, 1);
            assert_eq!(set.len(), 4);
            assert_eq!(set.iter().next_back(), Some(&date(2026, 7, 4)));
        }

        #[test]
        fn span_membership_matches_definition() {
            let window = DateWindow::new(date(2026, 1, 5), date(2026, 1, 25));
            let start = date(2026, 1, 1);
            let end = date(2026, 1, 20);

            let mut set = BookedDateSet::new();
            set.insert_span(start, end, &window);

            for day in DateWindow::new(date(2025, 12, 20), date(2026, 2, 10)).days() {
                let expected = start <= day && day < end && window.contains(day);
                assert_eq!(set.contains(&day), expected, "mismatch on {day}");
            }
        }

        #[test]
        fn serializes_as_sorted_list() {
            let set: BookedDateSet = [date(2026, 6, 13), date(2026, 6, 12)].into_iter().collect();
            let json = serde_json::to_string(&set).unwrap();
            assert_eq!(json, r#"["2026-06-12","2026-06-13"]"#);
        }
    }
}
