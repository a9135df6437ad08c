//! Server configuration.
//!
//! Venues come from an optional TOML file of `[[venue]]` tables:
//!
//! ```toml
//! [[venue]]
//! name = "garden"
//! calendar_id = "env::CALENDAR_ID_GARDEN"
//!
//! [[venue]]
//! name = "ballroom"
//! calendar_id = "env::CALENDAR_ID_BALLROOM"
//! lease_end = 2030-03-31
//! ```
//!
//! Without a file the built-in venues are used.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;
use toml::value::{Date, Datetime};
use tracing::warn;
use weekender_core::{Venue, VenueId};

use crate::error::{ServerError, ServerResult};
use crate::secret;

/// Default refresh interval: four hours.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(4 * 60 * 60);

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    pub bind: SocketAddr,

    /// Directory holding `index.html` and the assets under `/static`.
    pub static_dir: PathBuf,

    /// Time between periodic refresh cycles.
    pub refresh_interval: Duration,

    /// Venues in display order. The first one is the landing page.
    pub venues: Vec<Venue>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8000)),
            static_dir: PathBuf::from("static"),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            venues: default_venues(),
        }
    }
}

impl ServerConfig {
    /// Builder: set the bind address.
    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    /// Builder: set the static directory.
    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = dir.into();
        self
    }

    /// Builder: set the refresh interval.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Builder: replace the venue list.
    pub fn with_venues(mut self, venues: Vec<Venue>) -> Self {
        self.venues = venues;
        self
    }

    /// Checks the configuration before the server starts.
    pub fn validate(&self) -> ServerResult<()> {
        if self.venues.is_empty() {
            return Err(ServerError::config("at least one venue is required"));
        }
        if self.refresh_interval.is_zero() {
            return Err(ServerError::config("refresh interval must be positive"));
        }

        let mut seen = HashSet::new();
        for venue in &self.venues {
            if !seen.insert(venue.id.as_str()) {
                return Err(ServerError::config(format!("duplicate venue `{}`", venue.id)));
            }
        }
        Ok(())
    }
}

/// One `[[venue]]` table of the venue file.
#[derive(Debug, Clone, Deserialize)]
pub struct VenueSettings {
    /// Venue identifier, used in URLs.
    pub name: String,
    /// Calendar handle, plain or `env::VAR`.
    pub calendar_id: Option<String>,
    /// Last date the venue is offered, as a bare TOML date.
    pub lease_end: Option<Datetime>,
}

/// Converts a TOML local date into a calendar date.
///
/// Values carrying a time or an offset are rejected.
fn lease_date(venue: &str, value: &Datetime) -> ServerResult<NaiveDate> {
    let invalid = || {
        ServerError::config(format!(
            "venue `{}`: lease_end must be a date like 2030-03-31, got {}",
            venue, value
        ))
    };
    match (value.date, value.time, value.offset) {
        (Some(date), None, None) => {
            NaiveDate::from_ymd_opt(date.year.into(), date.month.into(), date.day.into())
                .ok_or_else(invalid)
        }
        _ => Err(invalid()),
    }
}

impl VenueSettings {
    /// Converts the settings into a venue, resolving the calendar reference.
    ///
    /// An unresolvable calendar reference leaves the venue without a
    /// calendar; its availability then shows no bookings.
    pub fn to_venue(&self) -> ServerResult<Venue> {
        let id = VenueId::new(self.name.as_str())
            .map_err(|e| ServerError::config(e.to_string()))?;
        let mut venue = Venue::new(id);

        if let Some(ref calendar_id) = self.calendar_id {
            match secret::resolve(calendar_id) {
                Ok(handle) => venue = venue.with_calendar_handle(handle),
                Err(e) => warn!(venue = %venue.id, error = %e, "calendar not configured"),
            }
        }
        if let Some(ref lease_end) = self.lease_end {
            venue = venue.with_lease_end(lease_date(&self.name, lease_end)?);
        }
        Ok(venue)
    }
}

/// The venue file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VenueFile {
    #[serde(default, rename = "venue")]
    pub venues: Vec<VenueSettings>,
}

impl VenueFile {
    /// Parses a venue file from TOML text.
    pub fn parse(content: &str) -> ServerResult<Self> {
        toml::from_str(content)
            .map_err(|e| ServerError::config(format!("failed to parse venue file: {}", e)))
    }

    /// Loads a venue file from disk.
    pub fn load_from(path: &Path) -> ServerResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ServerError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Converts every table into a venue.
    pub fn to_venues(&self) -> ServerResult<Vec<Venue>> {
        self.venues.iter().map(VenueSettings::to_venue).collect()
    }
}

/// Built-in venues used when no venue file is given.
pub fn default_venue_settings() -> Vec<VenueSettings> {
    vec![
        VenueSettings {
            name: "garden".to_string(),
            calendar_id: Some("env::CALENDAR_ID_GARDEN".to_string()),
            lease_end: None,
        },
        VenueSettings {
            name: "ballroom".to_string(),
            calendar_id: Some("env::CALENDAR_ID_BALLROOM".to_string()),
            lease_end: Some(Datetime {
                date: Some(Date {
                    year: 2030,
                    month: 3,
                    day: 31,
                }),
                time: None,
                offset: None,
            }),
        },
    ]
}

/// Resolves the built-in venues.
pub fn default_venues() -> Vec<Venue> {
    default_venue_settings()
        .iter()
        .filter_map(|settings| settings.to_venue().ok())
        .collect()
}
