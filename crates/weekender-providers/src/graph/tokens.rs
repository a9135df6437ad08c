//! Access token caching.
//!
//! [`TokenProvider`] owns the single process-wide credential slot. A cached
//! token is reused while it has more than five minutes left; otherwise the
//! refresh token is exchanged for a new one. Failures are logged and reported
//! as "no token" so callers can skip the cycle.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, warn};

use super::oauth::{OAuthClient, TokenGrant};

/// A bearer token and the instant it stops being valid.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessCredential {
    /// The bearer token.
    pub token: String,
    /// When the token expires.
    pub expires_at: DateTime<Utc>,
}

impl AccessCredential {
    /// Lifetime assumed when the token endpoint omits `expires_in`.
    pub const DEFAULT_LIFETIME_SECS: i64 = 3600;

    /// A token is only reused with more than this many seconds left.
    pub const REUSE_MARGIN_SECS: i64 = 300;

    /// Creates a credential.
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// Builds a credential from an exchange issued at `issued_at`.
    pub fn from_grant(grant: TokenGrant, issued_at: DateTime<Utc>) -> Self {
        let lifetime = grant.expires_in.unwrap_or(Self::DEFAULT_LIFETIME_SECS);
        Self::new(grant.access_token, issued_at + Duration::seconds(lifetime))
    }

    /// Returns true if the token may be used without a new exchange at `now`.
    pub fn is_reusable_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - now > Duration::seconds(Self::REUSE_MARGIN_SECS)
    }
}

impl fmt::Debug for AccessCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessCredential")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Hands out access tokens, exchanging the refresh token when needed.
#[derive(Debug)]
pub struct TokenProvider {
    oauth: OAuthClient,
    refresh_token: Option<String>,
    slot: RwLock<Option<Arc<AccessCredential>>>,
}

impl TokenProvider {
    /// Creates a token provider with an empty slot.
    pub fn new(oauth: OAuthClient, refresh_token: Option<String>) -> Self {
        Self {
            oauth,
            refresh_token,
            slot: RwLock::new(None),
        }
    }

    /// Returns true if a refresh token is configured.
    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// Returns the cached credential, if any, without checking its expiry.
    pub fn cached(&self) -> Option<Arc<AccessCredential>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store(&self, credential: Option<Arc<AccessCredential>>) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = credential;
    }

    /// Returns a usable access token, or `None` if none can be obtained.
    ///
    /// Never fails: configuration gaps and exchange errors are logged and
    /// yield `None`, which callers treat as "no data this cycle".
    pub async fn acquire_token(&self) -> Option<Arc<AccessCredential>> {
        let Some(refresh_token) = self.refresh_token.as_deref() else {
            warn!("no refresh token configured, cannot obtain an access token");
            return None;
        };

        if let Some(credential) = self.cached() {
            if credential.is_reusable_at(Utc::now()) {
                debug!(expires_at = %credential.expires_at, "reusing cached access token");
                return Some(credential);
            }
        }

        match self.oauth.refresh_access_token(refresh_token).await {
            Ok(grant) => {
                let credential = Arc::new(AccessCredential::from_grant(grant, Utc::now()));
                self.store(Some(Arc::clone(&credential)));
                Some(credential)
            }
            Err(e) => {
                error!(token_url = %self.oauth.token_url(), error = %e, "access token exchange failed");
                None
            }
        }
    }

    /// Drops the cached credential so the next call exchanges again.
    pub fn invalidate(&self) {
        if self.cached().is_some() {
            debug!("invalidating cached access token");
        }
        self.store(None);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::post;

    use super::*;
    use crate::graph::config::OAuthCredentials;
    use crate::graph::testing::{TokenEndpoint, spawn, unreachable_base};

    fn provider(token_url: String, refresh_token: Option<&str>) -> TokenProvider {
        let oauth = OAuthClient::new(
            OAuthCredentials::new("client-id", "client-secret"),
            token_url,
            "offline_access Calendars.Read",
            reqwest::Client::new(),
        );
        TokenProvider::new(oauth, refresh_token.map(str::to_string))
    }

    #[test]
    fn credential_reuse_margin() {
        let now = Utc::now();
        let fresh = AccessCredential::new("t", now + Duration::minutes(30));
        assert!(fresh.is_reusable_at(now));

        let nearly_expired = AccessCredential::new("t", now + Duration::minutes(5));
        assert!(!nearly_expired.is_reusable_at(now));

        let expired = AccessCredential::new("t", now - Duration::seconds(1));
        assert!(!expired.is_reusable_at(now));
    }

    #[test]
    fn credential_default_lifetime() {
        let issued_at = Utc::now();
        let grant = TokenGrant {
            access_token: "t".to_string(),
            expires_in: None,
        };
        let credential = AccessCredential::from_grant(grant, issued_at);
        assert_eq!(credential.expires_at, issued_at + Duration::seconds(3600));
    }

    #[test]
    fn credential_debug_redacts_token() {
        let credential = AccessCredential::new("super-secret", Utc::now());
        let debug = format!("{:?}", credential);
        assert!(!debug.contains("super-secret"));
    }

    #[tokio::test]
    async fn reuses_token_within_validity() {
        let endpoint = Arc::new(TokenEndpoint::with_expires_in(3600));
        let base = spawn(endpoint.router()).await;
        let tokens = provider(format!("{base}/token"), Some("refresh-secret"));

        let first = tokens.acquire_token().await.expect("first token");
        let second = tokens.acquire_token().await.expect("second token");

        assert_eq!(first.token, "access-1");
        assert_eq!(second.token, "access-1");
        assert_eq!(endpoint.calls(), 1);
    }

    #[tokio::test]
    async fn exchange_sends_refresh_grant() {
        let endpoint = Arc::new(TokenEndpoint::default());
        let base = spawn(endpoint.router()).await;
        let tokens = provider(format!("{base}/token"), Some("refresh-secret"));

        let credential = tokens.acquire_token().await.expect("token");

        let form = endpoint.last_form.lock().unwrap().clone().expect("form recorded");
        assert_eq!(form["grant_type"], "refresh_token");
        assert_eq!(form["refresh_token"], "refresh-secret");
        assert_eq!(form["client_id"], "client-id");
        assert_eq!(form["client_secret"], "client-secret");
        assert_eq!(form["scope"], "offline_access Calendars.Read");

        // No expires_in in the response: one hour is assumed
        let remaining = credential.expires_at - Utc::now();
        assert!(remaining > Duration::seconds(3590) && remaining <= Duration::seconds(3600));
    }

    #[tokio::test]
    async fn short_lived_token_is_exchanged_again() {
        let endpoint = Arc::new(TokenEndpoint::with_expires_in(120));
        let base = spawn(endpoint.router()).await;
        let tokens = provider(format!("{base}/token"), Some("refresh-secret"));

        tokens.acquire_token().await.expect("first token");
        let second = tokens.acquire_token().await.expect("second token");

        assert_eq!(second.token, "access-2");
        assert_eq!(endpoint.calls(), 2);
    }

    #[tokio::test]
    async fn missing_refresh_token_is_unavailable_without_network() {
        let endpoint = Arc::new(TokenEndpoint::default());
        let base = spawn(endpoint.router()).await;
        let tokens = provider(format!("{base}/token"), None);

        assert!(!tokens.has_refresh_token());
        assert!(tokens.acquire_token().await.is_none());
        assert_eq!(endpoint.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rejected_exchange_is_unavailable() {
        let router = Router::new().route(
            "/token",
            post(|| async { (StatusCode::BAD_REQUEST, r#"{"error":"invalid_grant"}"#) }),
        );
        let base = spawn(router).await;
        let tokens = provider(format!("{base}/token"), Some("revoked"));

        assert!(tokens.acquire_token().await.is_none());
        assert!(tokens.cached().is_none());
    }

    #[tokio::test]
    async fn malformed_token_response_is_unavailable() {
        let router = Router::new().route("/token", post(|| async { "<html>not json</html>" }));
        let base = spawn(router).await;
        let tokens = provider(format!("{base}/token"), Some("refresh-secret"));

        assert!(tokens.acquire_token().await.is_none());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_unavailable() {
        let base = unreachable_base().await;
        let tokens = provider(format!("{base}/token"), Some("refresh-secret"));

        assert!(tokens.acquire_token().await.is_none());
    }

    #[tokio::test]
    async fn invalidate_forces_new_exchange() {
        let endpoint = Arc::new(TokenEndpoint::with_expires_in(3600));
        let base = spawn(endpoint.router()).await;
        let tokens = provider(format!("{base}/token"), Some("refresh-secret"));

        tokens.acquire_token().await.expect("first token");
        tokens.invalidate();
        assert!(tokens.cached().is_none());

        let second = tokens.acquire_token().await.expect("second token");
        assert_eq!(second.token, "access-2");
        assert_eq!(endpoint.calls(), 2);
    }

    #[tokio::test]
    async fn expiring_token_is_not_handed_out_when_exchange_fails() {
        let router = Router::new().route(
            "/token",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let base = spawn(router).await;
        let tokens = provider(format!("{base}/token"), Some("refresh-secret"));
        tokens.store(Some(Arc::new(AccessCredential::new(
            "stale",
            Utc::now() + Duration::minutes(1),
        ))));

        assert!(tokens.acquire_token().await.is_none());
    }
}
