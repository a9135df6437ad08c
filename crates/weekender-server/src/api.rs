//! HTTP routes.
//!
//! | route | response |
//! |---|---|
//! | `GET /health` | `{"status":"healthy"}` |
//! | `GET /` | redirect to the first venue |
//! | `GET /api/availability/:venue?year=Y` | weekend availability |
//! | `GET /static/*` | static assets |
//! | `GET /:venue` | the `index.html` page |

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};
use weekender_core::{VenueId, WeekendDayRecord, YearRange, project};

use crate::cache::{VenueCache, system_today};
use crate::error::ServerError;

/// Source of "today" for request handling.
pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<VenueCache>,
    pub static_dir: Arc<PathBuf>,
    pub today: Clock,
}

impl AppState {
    /// Creates state that reads the local system date.
    pub fn new(cache: Arc<VenueCache>, static_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache,
            static_dir: Arc::new(static_dir.into()),
            today: Arc::new(system_today),
        }
    }

    /// Builder: pin "today" to a fixed date.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Arc::new(move || today);
        self
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let assets = ServeDir::new(state.static_dir.as_path());

    Router::new()
        .route("/health", get(health))
        .route("/", get(landing))
        .route("/api/availability/:venue", get(availability))
        .nest_service("/static", assets)
        .route("/:venue", get(venue_page))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Error body: `{"detail": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    detail: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            detail: &self.detail,
        });
        (self.status, body).into_response()
    }
}

impl From<ServerError> for ApiError {
    fn from(err: ServerError) -> Self {
        let status = match err {
            ServerError::UnknownVenue { .. } => StatusCode::NOT_FOUND,
            _ if err.is_client_error() => StatusCode::BAD_REQUEST,
            _ => {
                error!(error = %err, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, err.to_string())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct HealthResponse {
    status: String,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

async fn landing(State(state): State<AppState>) -> Result<Redirect, ApiError> {
    match state.cache.venues().first() {
        Some(venue) => Ok(Redirect::temporary(&format!("/{}", venue.id))),
        None => Err(ApiError::new(StatusCode::NOT_FOUND, "No venues configured")),
    }
}

async fn venue_page(
    State(state): State<AppState>,
    Path(venue): Path<String>,
) -> Result<Html<String>, ApiError> {
    state.cache.venue(&venue)?;

    let index = state.static_dir.join("index.html");
    match tokio::fs::read_to_string(&index).await {
        Ok(page) => Ok(Html(page)),
        Err(e) => {
            warn!(path = %index.display(), error = %e, "index page unavailable");
            Err(ApiError::new(StatusCode::NOT_FOUND, "Page not available"))
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AvailabilityQuery {
    /// Kept as text so a malformed value yields the JSON error body.
    pub year: Option<String>,
}

/// Body of `GET /api/availability/:venue`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub venue: VenueId,
    pub year: i32,
    pub min_year: i32,
    pub max_year: i32,
    pub lease_end: Option<NaiveDate>,
    pub last_updated: Option<DateTime<Utc>>,
    pub fetched_through: Option<NaiveDate>,
    pub days: Vec<WeekendDayRecord>,
}

fn parse_year(raw: Option<&str>, today: NaiveDate) -> Result<i32, ServerError> {
    match raw {
        None => Ok(today.year()),
        Some(value) => value.trim().parse().map_err(|_| ServerError::MalformedYear {
            value: value.to_string(),
        }),
    }
}

async fn availability(
    State(state): State<AppState>,
    Path(venue): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let venue = state.cache.venue(&venue)?;
    let today = (state.today)();

    let range = YearRange::for_venue(today, venue.lease_end);
    let year = parse_year(query.year.as_deref(), today)?;
    if !range.contains(year) {
        return Err(ServerError::YearOutOfRange {
            year,
            min: range.min,
            max: range.max,
        }
        .into());
    }

    // One entry for the whole walk, even if a refresh lands meanwhile
    let entry = state.cache.get(venue.id.as_str())?;
    let days = project(year, &entry.booked_dates, venue.lease_end, today);

    Ok(Json(AvailabilityResponse {
        venue: venue.id.clone(),
        year,
        min_year: range.min,
        max_year: range.max,
        lease_end: venue.lease_end,
        last_updated: entry.last_updated,
        fetched_through: entry.fetched_through,
        days,
    }))
}
