//! Per-venue cache of booked dates.
//!
//! Every venue has one entry holding the booked dates of the most recent
//! refresh together with the time that refresh finished. Entries are
//! replaced whole, so a reader holding an `Arc<VenueCacheEntry>` always sees
//! dates and timestamp from the same cycle.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};
use tracing::{debug, info};
use weekender_core::{
    BookedDateSet, DateWindow, MAX_YEARS_AHEAD, Venue, VenueId, last_day_of_year,
};
use weekender_providers::CalendarProvider;

use crate::error::{ServerError, ServerResult};

/// How far ahead every refresh fetches, in calendar months.
pub const FETCH_HORIZON_MONTHS: u32 = 48;

/// Returns the local calendar date.
pub fn system_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Computes the window fetched on a refresh started on `today`.
///
/// The window runs 48 months ahead and is stretched to December 31st of the
/// last year the API accepts, so every requestable date is covered.
pub fn fetch_window(today: NaiveDate) -> DateWindow {
    let window = DateWindow::months_ahead(today, FETCH_HORIZON_MONTHS);
    match last_day_of_year(today.year() + MAX_YEARS_AHEAD) {
        Some(year_end) => window.extended_to(year_end),
        None => window,
    }
}

/// Cached state of one venue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VenueCacheEntry {
    /// Dates booked as of the last refresh.
    pub booked_dates: BookedDateSet,
    /// When the last refresh of this venue finished. `None` until the first.
    pub last_updated: Option<DateTime<Utc>>,
    /// Last date covered by the last refresh.
    pub fetched_through: Option<NaiveDate>,
}

impl VenueCacheEntry {
    /// Creates an entry for a completed refresh.
    pub fn refreshed(
        booked_dates: BookedDateSet,
        window: DateWindow,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            booked_dates,
            last_updated: Some(at),
            fetched_through: Some(window.to),
        }
    }

    /// Returns true if no refresh has completed for this venue yet.
    pub fn is_pending(&self) -> bool {
        self.last_updated.is_none()
    }
}

/// Outcome of one refresh of a venue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueRefresh {
    pub venue: VenueId,
    pub booked: usize,
}

/// Outcome of one refresh cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    /// Window every venue was fetched for.
    pub window: DateWindow,
    /// Per-venue results in configuration order.
    pub venues: Vec<VenueRefresh>,
}

impl RefreshReport {
    /// Total booked dates across all venues.
    pub fn total_booked(&self) -> usize {
        self.venues.iter().map(|v| v.booked).sum()
    }
}

/// The availability cache shared by the scheduler and the HTTP handlers.
#[derive(Debug)]
pub struct VenueCache {
    venues: Vec<Venue>,
    entries: RwLock<HashMap<VenueId, Arc<VenueCacheEntry>>>,
}

impl VenueCache {
    /// Creates a cache with an empty entry for every venue.
    pub fn new(venues: Vec<Venue>) -> Self {
        let entries = venues
            .iter()
            .map(|venue| (venue.id.clone(), Arc::new(VenueCacheEntry::default())))
            .collect();
        Self {
            venues,
            entries: RwLock::new(entries),
        }
    }

    /// Returns the configured venues in order.
    pub fn venues(&self) -> &[Venue] {
        &self.venues
    }

    /// Looks up a venue by identifier.
    pub fn venue(&self, id: &str) -> ServerResult<&Venue> {
        self.venues
            .iter()
            .find(|venue| venue.id.as_str() == id)
            .ok_or_else(|| self.unknown(id))
    }

    /// Returns the current entry of a venue.
    pub fn get(&self, id: &str) -> ServerResult<Arc<VenueCacheEntry>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(id).cloned().ok_or_else(|| self.unknown(id))
    }

    /// Replaces the entry of a venue in one step.
    pub fn replace(&self, id: &VenueId, entry: VenueCacheEntry) -> ServerResult<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        match entries.get_mut(id) {
            Some(slot) => {
                *slot = Arc::new(entry);
                Ok(())
            }
            None => Err(self.unknown(id.as_str())),
        }
    }

    /// Refreshes every venue from the provider, one after another.
    ///
    /// Providers fail soft, so a venue whose fetch failed is stored with an
    /// empty set and the cycle carries on with the next venue.
    pub async fn refresh_all(
        &self,
        provider: &dyn CalendarProvider,
        today: NaiveDate,
    ) -> RefreshReport {
        let window = fetch_window(today);
        debug!(from = %window.from, to = %window.to, "refreshing venues");

        let mut report = RefreshReport {
            window,
            venues: Vec::with_capacity(self.venues.len()),
        };

        for venue in &self.venues {
            let booked = provider
                .fetch_booked_dates(venue.calendar_handle.as_deref(), window)
                .await;
            let count = booked.len();

            let entry = VenueCacheEntry::refreshed(booked, window, Utc::now());
            if let Err(e) = self.replace(&venue.id, entry) {
                debug!(error = %e, "venue disappeared during refresh");
                continue;
            }

            info!(venue = %venue.id, booked = count, "venue refreshed");
            report.venues.push(VenueRefresh {
                venue: venue.id.clone(),
                booked: count,
            });
        }

        report
    }

    fn unknown(&self, id: &str) -> ServerError {
        ServerError::unknown_venue(
            id,
            self.venues.iter().map(|venue| venue.id.to_string()).collect(),
        )
    }
}
