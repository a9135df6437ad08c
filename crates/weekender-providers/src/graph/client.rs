//! Microsoft Graph calendar API client.
//!
//! Low-level page fetching and the wire model of calendar events. The
//! accumulation policy lives in [`GraphProvider`](super::GraphProvider).

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult};

/// Fields requested for each event.
const EVENT_FIELDS: &str = "subject,start,end,isAllDay,showAs";

/// Ordering of the event listing.
const EVENT_ORDER: &str = "start/dateTime";

/// One page of an event listing.
#[derive(Debug, Deserialize)]
pub(crate) struct EventPage {
    #[serde(default)]
    pub value: Vec<ApiEvent>,
    /// Absolute URL of the next page, query included.
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

/// A calendar event as returned by Graph.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiEvent {
    pub subject: Option<String>,
    #[serde(default)]
    pub is_all_day: bool,
    pub start: Option<ApiDateTime>,
    pub end: Option<ApiDateTime>,
    #[allow(dead_code)]
    pub show_as: Option<String>,
}

/// Graph's `dateTimeTimeZone` value.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiDateTime {
    pub date_time: Option<String>,
    #[allow(dead_code)]
    pub time_zone: Option<String>,
}

impl ApiEvent {
    /// Returns the half-open `[start, end)` date span of an all-day event.
    ///
    /// Timed events yield `None`. All-day events with a missing or
    /// unparseable boundary are logged and yield `None`.
    pub fn all_day_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        if !self.is_all_day {
            return None;
        }

        let start = self.boundary(self.start.as_ref());
        let end = self.boundary(self.end.as_ref());
        match (start, end) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => {
                warn!(
                    subject = self.subject.as_deref().unwrap_or(""),
                    start = ?self.start.as_ref().and_then(|s| s.date_time.as_deref()),
                    end = ?self.end.as_ref().and_then(|e| e.date_time.as_deref()),
                    "skipping all-day event with unreadable dates"
                );
                None
            }
        }
    }

    fn boundary(&self, value: Option<&ApiDateTime>) -> Option<NaiveDate> {
        value
            .and_then(|v| v.date_time.as_deref())
            .and_then(parse_calendar_date)
    }
}

/// Parses the calendar date of a Graph timestamp.
///
/// Accepts `2026-06-12T00:00:00.0000000`, the same with a `Z` or `+hh:mm`
/// suffix, and bare `2026-06-12`. Zone markers are dropped, not applied:
/// all-day boundaries are wall dates in the calendar's own zone.
pub(crate) fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let raw = raw.strip_suffix('Z').unwrap_or(raw);

    match raw.split_once('T') {
        Some((date, time)) => {
            let time = time.find(['+', '-']).map_or(time, |idx| &time[..idx]);
            NaiveDateTime::parse_from_str(&format!("{date}T{time}"), "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        }
        None => NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok(),
    }
}

/// Where the next page comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PageRequest {
    /// The first page: the listing URL plus the query parameters.
    First(String),
    /// A continuation link, requested verbatim.
    Next(String),
}

/// Graph calendar API client.
#[derive(Debug, Clone)]
pub(crate) struct GraphCalendarClient {
    http_client: reqwest::Client,
    api_base: String,
    page_size: u32,
}

impl GraphCalendarClient {
    /// Creates a client sharing the given HTTP client.
    pub fn new(http_client: reqwest::Client, api_base: impl Into<String>, page_size: u32) -> Self {
        Self {
            http_client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            page_size,
        }
    }

    /// Returns the event listing URL of a calendar.
    pub fn events_url(&self, calendar_handle: &str) -> String {
        format!(
            "{}/me/calendars/{}/events",
            self.api_base,
            urlencoding::encode(calendar_handle)
        )
    }

    /// Fetches one page of events.
    ///
    /// Continuation links already embed the query, so only the first page
    /// carries `$select`, `$top` and `$orderby`.
    pub async fn fetch_page(
        &self,
        request: &PageRequest,
        access_token: &str,
    ) -> ProviderResult<EventPage> {
        let builder = match request {
            PageRequest::First(url) => self.http_client.get(url).query(&[
                ("$select", EVENT_FIELDS.to_string()),
                ("$top", self.page_size.to_string()),
                ("$orderby", EVENT_ORDER.to_string()),
            ]),
            PageRequest::Next(link) => self.http_client.get(link),
        };

        let response = builder
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::network("request timeout")
                } else if e.is_connect() {
                    ProviderError::network(format!("connection failed: {}", e))
                } else {
                    ProviderError::network(format!("request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(ProviderError::from_status(status.as_u16(), "event listing", &body));
        }

        let page: EventPage = serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse event page: {}", e))
        })?;

        debug!(
            events = page.value.len(),
            has_next = page.next_link.is_some(),
            "fetched event page"
        );
        Ok(page)
    }
}
