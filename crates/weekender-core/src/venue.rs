//! Venue identifiers and per-venue configuration.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a string is not a valid venue identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid venue identifier {0:?}: expected lowercase letters, digits, '-' or '_'")]
pub struct InvalidVenueId(String);

/// A venue identifier such as `garden` or `ballroom`.
///
/// Identifiers are lowercase ASCII slugs so they can appear verbatim in
/// URL paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VenueId(String);

impl VenueId {
    /// Creates a venue identifier, validating its format.
    pub fn new(id: impl Into<String>) -> Result<Self, InvalidVenueId> {
        let id = id.into();
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
        if valid {
            Ok(Self(id))
        } else {
            Err(InvalidVenueId(id))
        }
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VenueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for VenueId {
    type Err = InvalidVenueId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for VenueId {
    type Error = InvalidVenueId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VenueId> for String {
    fn from(id: VenueId) -> Self {
        id.0
    }
}

impl Borrow<str> for VenueId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Static configuration of a bookable venue.
///
/// Immutable for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Venue {
    /// The venue identifier.
    pub id: VenueId,
    /// Provider-specific handle of the calendar holding this venue's bookings.
    ///
    /// `None` means the calendar is not configured; fetches for the venue
    /// then yield no bookings.
    pub calendar_handle: Option<String>,
    /// Last date on which the venue is offered at all.
    pub lease_end: Option<NaiveDate>,
}

impl Venue {
    /// Creates a venue with no calendar and no lease boundary.
    pub fn new(id: VenueId) -> Self {
        Self {
            id,
            calendar_handle: None,
            lease_end: None,
        }
    }

    /// Builder method to set the calendar handle.
    ///
    /// Blank handles are treated as unconfigured.
    pub fn with_calendar_handle(mut self, handle: impl Into<String>) -> Self {
        let handle = handle.into();
        let handle = handle.trim();
        self.calendar_handle = (!handle.is_empty()).then(|| handle.to_string());
        self
    }

    /// Builder method to set the lease boundary.
    pub fn with_lease_end(mut self, lease_end: NaiveDate) -> Self {
        self.lease_end = Some(lease_end);
        self
    }
}
