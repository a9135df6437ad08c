//! Microsoft Graph provider implementation.
//!
//! This module implements the [`CalendarProvider`] trait for Outlook
//! calendars reached through Microsoft Graph.

use tracing::{debug, error, info, warn};
use weekender_core::{BookedDateSet, DateWindow};

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{BoxFuture, CalendarProvider};

use super::client::{GraphCalendarClient, PageRequest};
use super::config::GraphConfig;
use super::oauth::OAuthClient;
use super::tokens::TokenProvider;

/// Microsoft Graph booked-date provider.
///
/// Every all-day event on a venue calendar blocks the dates it covers.
/// Timed events are ignored.
#[derive(Debug)]
pub struct GraphProvider {
    tokens: TokenProvider,
    client: GraphCalendarClient,
}

impl GraphProvider {
    /// Provider name used in logs and errors.
    pub const NAME: &'static str = "graph";

    /// Creates a new Graph provider with the given configuration.
    ///
    /// Missing credentials or refresh token are not an error: the provider
    /// is created and every fetch returns an empty set.
    pub fn new(config: GraphConfig) -> ProviderResult<Self> {
        config
            .validate()
            .map_err(|e| ProviderError::configuration(e).with_provider(Self::NAME))?;

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| {
                ProviderError::internal(format!("failed to create HTTP client: {}", e))
                    .with_provider(Self::NAME)
            })?;

        if !config.is_configured() {
            warn!("Graph credentials or refresh token missing, booked dates will stay empty");
        }

        let oauth = OAuthClient::new(
            config.credentials.clone(),
            config.token_url.clone(),
            config.scope.clone(),
            http_client.clone(),
        );
        let client = GraphCalendarClient::new(http_client, config.api_base.clone(), config.page_size);

        Ok(Self {
            tokens: TokenProvider::new(oauth, config.refresh_token),
            client,
        })
    }

    /// Returns the token provider backing this client.
    pub fn tokens(&self) -> &TokenProvider {
        &self.tokens
    }

    /// Collects the booked dates of one calendar within `window`.
    ///
    /// Pages are read until the listing ends or a request fails; on failure
    /// the dates gathered from earlier pages are kept.
    pub async fn booked_dates(&self, calendar_handle: Option<&str>, window: DateWindow) -> BookedDateSet {
        let mut booked = BookedDateSet::new();

        let Some(handle) = calendar_handle.map(str::trim).filter(|h| !h.is_empty()) else {
            warn!("no calendar configured, nothing to fetch");
            return booked;
        };

        if window.is_empty() {
            debug!(calendar = handle, "empty fetch window");
            return booked;
        }

        let Some(credential) = self.tokens.acquire_token().await else {
            warn!(calendar = handle, "no access token, skipping fetch this cycle");
            return booked;
        };

        let mut next = Some(PageRequest::First(self.client.events_url(handle)));
        let mut pages = 0usize;
        let mut events = 0usize;

        while let Some(request) = next.take() {
            let page = match self.client.fetch_page(&request, &credential.token).await {
                Ok(page) => page,
                Err(e) => {
                    let e = e.with_provider(Self::NAME);
                    if e.is_unauthorized() {
                        self.tokens.invalidate();
                    }
                    error!(
                        calendar = handle,
                        pages_read = pages,
                        code = %e.code(),
                        transient = e.code().is_transient(),
                        error = %e,
                        "event listing failed, keeping dates read so far"
                    );
                    break;
                }
            };

            pages += 1;
            events += page.value.len();
            for event in &page.value {
                if let Some((start, end)) = event.all_day_span() {
                    booked.insert_span(start, end, &window);
                }
            }
            next = page.next_link.map(PageRequest::Next);
        }

        info!(
            calendar = handle,
            pages,
            events,
            booked = booked.len(),
            "fetched booked dates"
        );
        booked
    }
}

impl CalendarProvider for GraphProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn fetch_booked_dates<'a>(
        &'a self,
        calendar_handle: Option<&'a str>,
        window: DateWindow,
    ) -> BoxFuture<'a, BookedDateSet> {
        Box::pin(self.booked_dates(calendar_handle, window))
    }
}
