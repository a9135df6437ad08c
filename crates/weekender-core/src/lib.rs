//! Core types: booked dates, venues, weekend availability projection, tracing

pub mod availability;
pub mod date;
pub mod tracing;
pub mod venue;

pub use availability::{DayName, MAX_YEARS_AHEAD, WeekendDayRecord, YearRange, project, scan_window};
pub use date::{BookedDateSet, DateWindow, last_day_of_year};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
pub use venue::{InvalidVenueId, Venue, VenueId};
