//! Microsoft Graph provider implementation.
//!
//! This module provides a [`GraphProvider`] that reads venue bookings from
//! Outlook calendars through the Microsoft Graph API.
//!
//! # Flow
//!
//! 1. [`TokenProvider`] exchanges the configured refresh token for an access
//!    token and caches it until five minutes before expiry
//! 2. The event listing of the venue calendar is read page by page, following
//!    `@odata.nextLink`
//! 3. Every all-day event contributes its `[start, end)` dates, clamped to
//!    the fetch window
//!
//! # Example
//!
//! ```ignore
//! use weekender_providers::graph::{GraphConfig, GraphProvider, OAuthCredentials};
//!
//! let config = GraphConfig::new(OAuthCredentials::new(client_id, client_secret))
//!     .with_refresh_token(refresh_token);
//! let provider = GraphProvider::new(config)?;
//!
//! let booked = provider.booked_dates(Some(calendar_id), window).await;
//! ```

mod client;
mod config;
mod oauth;
mod provider;
#[cfg(test)]
mod testing;
mod tokens;

pub use config::{GraphConfig, OAuthCredentials};
pub use oauth::{OAuthClient, TokenGrant};
pub use provider::GraphProvider;
pub use tokens::{AccessCredential, TokenProvider};
