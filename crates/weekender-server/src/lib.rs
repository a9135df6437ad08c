//! Weekend availability service.
//!
//! Keeps an in-memory cache of booked dates per venue, refreshed from a
//! calendar provider at startup and on a fixed interval, and serves weekend
//! availability over HTTP.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use weekender_providers::StaticProvider;
//! use weekender_server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     weekender_server::run(config, Arc::new(StaticProvider::new())).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
mod cache;
pub mod cli;
mod config;
mod error;
mod scheduler;
mod secret;
mod server;
mod signals;

pub use api::{AppState, AvailabilityResponse, router};
pub use cache::{
    FETCH_HORIZON_MONTHS, RefreshReport, VenueCache, VenueCacheEntry, VenueRefresh, fetch_window,
    system_today,
};
pub use config::{
    DEFAULT_REFRESH_INTERVAL, ServerConfig, VenueFile, VenueSettings, default_venues,
};
pub use error::{ServerError, ServerResult};
pub use scheduler::{
    Scheduler, SchedulerCommand, SchedulerConfig, SchedulerHandle, SchedulerState,
    SharedSchedulerState,
};
pub use server::run;
pub use signals::{ReloadSignal, ShutdownSignal, SignalHandler};
