//! CalendarProvider trait definition.
//!
//! A provider turns a venue's calendar into the set of dates on which the
//! venue is booked. Providers are fail-soft: they never return an error to
//! the caller, only a possibly empty or partial [`BookedDateSet`].

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};

use weekender_core::{BookedDateSet, DateWindow};

/// A boxed future for async trait methods.
///
/// Boxing keeps the trait object-safe so the server can hold an
/// `Arc<dyn CalendarProvider>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Source of booked dates for venue calendars.
///
/// # Implementation Notes
///
/// - `calendar_handle` of `None` (or blank) means the venue has no calendar
///   configured; implementations return an empty set without any I/O.
/// - Only dates inside `window` (inclusive on both ends) may be returned.
/// - Failures are logged and degrade to whatever was collected so far.
pub trait CalendarProvider: Send + Sync {
    /// Returns the name of this provider (e.g. "graph").
    fn name(&self) -> &str;

    /// Fetches the booked dates of one calendar within `window`.
    fn fetch_booked_dates<'a>(
        &'a self,
        calendar_handle: Option<&'a str>,
        window: DateWindow,
    ) -> BoxFuture<'a, BookedDateSet>;
}

/// A provider serving fixed booked dates from memory.
///
/// Used when running without provider credentials and as a test double.
#[derive(Debug, Default)]
pub struct StaticProvider {
    calendars: HashMap<String, BookedDateSet>,
    calls: AtomicUsize,
}

impl StaticProvider {
    /// Creates a provider with no calendars.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to register the booked dates of a calendar.
    pub fn with_calendar(mut self, handle: impl Into<String>, booked: BookedDateSet) -> Self {
        self.calendars.insert(handle.into(), booked);
        self
    }

    /// Returns how many fetches have been served.
    pub fn fetch_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CalendarProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    fn fetch_booked_dates<'a>(
        &'a self,
        calendar_handle: Option<&'a str>,
        window: DateWindow,
    ) -> BoxFuture<'a, BookedDateSet> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let booked = calendar_handle
            .and_then(|handle| self.calendars.get(handle))
            .map(|dates| {
                dates
                    .iter()
                    .copied()
                    .filter(|date| window.contains(*date))
                    .collect()
            })
            .unwrap_or_default();
        Box::pin(async move { booked })
    }
}
