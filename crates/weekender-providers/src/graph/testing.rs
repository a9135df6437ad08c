//! In-process HTTP fixtures standing in for the token endpoint and Graph.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Form, Path, RawQuery, State};
use axum::http::header::{AUTHORIZATION, HOST};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use super::config::{GraphConfig, OAuthCredentials};

/// Serves `router` on an ephemeral loopback port and returns its base URL.
pub(crate) async fn spawn(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Returns a base URL nothing is listening on.
pub(crate) async fn unreachable_base() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// A token endpoint that counts exchanges and records the last form.
#[derive(Debug, Default)]
pub(crate) struct TokenEndpoint {
    pub calls: AtomicUsize,
    pub last_form: Mutex<Option<HashMap<String, String>>>,
    pub expires_in: Option<i64>,
}

impl TokenEndpoint {
    pub fn with_expires_in(expires_in: i64) -> Self {
        Self {
            expires_in: Some(expires_in),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn router(self: &Arc<Self>) -> Router {
        Router::new()
            .route("/token", post(issue_token))
            .with_state(Arc::clone(self))
    }
}

async fn issue_token(
    State(endpoint): State<Arc<TokenEndpoint>>,
    Form(form): Form<HashMap<String, String>>,
) -> Json<Value> {
    let n = endpoint.calls.fetch_add(1, Ordering::SeqCst) + 1;
    *endpoint.last_form.lock().unwrap() = Some(form);

    let mut body = json!({
        "token_type": "Bearer",
        "access_token": format!("access-{n}"),
    });
    if let Some(secs) = endpoint.expires_in {
        body["expires_in"] = json!(secs);
    }
    Json(body)
}

/// A configured Graph setup pointing both endpoints at `base`.
pub(crate) fn graph_config(base: &str) -> GraphConfig {
    GraphConfig::new(OAuthCredentials::new("client-id", "client-secret"))
        .with_refresh_token("refresh-secret")
        .with_token_url(format!("{base}/token"))
        .with_api_base(base)
}

/// Scripted response for one page of an event listing.
#[derive(Debug, Clone)]
pub(crate) enum PageScript {
    Events(Vec<Value>),
    Fail(StatusCode),
}

/// A request seen by [`GraphEndpoint`].
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub handle: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
}

/// An event listing that serves scripted pages linked by `@odata.nextLink`.
///
/// The first request is page 1; continuation links carry `page=N`.
#[derive(Debug, Default)]
pub(crate) struct GraphEndpoint {
    pub pages: Vec<PageScript>,
    pub requests: Mutex<Vec<RecordedRequest>>,
}

impl GraphEndpoint {
    pub fn new(pages: Vec<PageScript>) -> Self {
        Self {
            pages,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn router(self: &Arc<Self>) -> Router {
        Router::new()
            .route("/me/calendars/:handle/events", get(list_events))
            .with_state(Arc::clone(self))
    }
}

async fn list_events(
    State(endpoint): State<Arc<GraphEndpoint>>,
    Path(handle): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    endpoint.requests.lock().unwrap().push(RecordedRequest {
        handle: handle.clone(),
        query: query.clone(),
        authorization,
    });

    let page = query
        .as_deref()
        .and_then(|q| q.split('&').find_map(|kv| kv.strip_prefix("page=")))
        .and_then(|n| n.parse::<usize>().ok())
        .unwrap_or(1);

    match endpoint.pages.get(page - 1) {
        Some(PageScript::Events(events)) => {
            let mut body = json!({ "value": events });
            if page < endpoint.pages.len() {
                let host = headers
                    .get(HOST)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("127.0.0.1");
                body["@odata.nextLink"] = json!(format!(
                    "http://{host}/me/calendars/{handle}/events?page={}&$skiptoken=opaque",
                    page + 1
                ));
            }
            Json(body).into_response()
        }
        Some(PageScript::Fail(status)) => (*status, "upstream failure").into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// An all-day event spanning `[start, end)`.
pub(crate) fn all_day(subject: &str, start: &str, end: &str) -> Value {
    json!({
        "subject": subject,
        "isAllDay": true,
        "showAs": "busy",
        "start": { "dateTime": format!("{start}T00:00:00.0000000"), "timeZone": "UTC" },
        "end": { "dateTime": format!("{end}T00:00:00.0000000"), "timeZone": "UTC" },
    })
}

/// A timed event on `day`.
pub(crate) fn timed(subject: &str, day: &str) -> Value {
    json!({
        "subject": subject,
        "isAllDay": false,
        "showAs": "busy",
        "start": { "dateTime": format!("{day}T10:00:00.0000000"), "timeZone": "UTC" },
        "end": { "dateTime": format!("{day}T12:00:00.0000000"), "timeZone": "UTC" },
    })
}
