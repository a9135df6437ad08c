//! Booked-date providers.
//!
//! This crate provides the abstraction layer between venue calendars and the
//! availability cache:
//!
//! - [`CalendarProvider`] - The trait every booking backend implements
//! - [`StaticProvider`] - In-memory bookings for offline runs and tests
//! - [`graph::GraphProvider`] - Outlook calendars through Microsoft Graph
//! - [`ProviderError`] - Error types for provider internals
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   ┌──────────────────┐
//! │  Token endpoint  │   │   Graph events   │
//! └────────┬─────────┘   └────────┬─────────┘
//!          │                      │
//!          ▼                      ▼
//! ┌──────────────────┐   ┌──────────────────┐
//! │  TokenProvider   │──▶│  GraphProvider   │
//! └──────────────────┘   └────────┬─────────┘
//!                                 │ CalendarProvider
//!                                 ▼
//!                        ┌──────────────────┐
//!                        │  BookedDateSet   │
//!                        └──────────────────┘
//! ```

pub mod error;
#[cfg(feature = "graph")]
pub mod graph;
pub mod provider;

// Re-export main types at crate root
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use provider::{BoxFuture, CalendarProvider, StaticProvider};
