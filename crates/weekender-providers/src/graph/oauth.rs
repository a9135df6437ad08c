//! OAuth 2.0 refresh-token grant against the Microsoft identity platform.

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};

use super::config::OAuthCredentials;

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
}

/// A freshly issued access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    /// The bearer token.
    pub access_token: String,
    /// Validity in seconds, if the endpoint reported it.
    pub expires_in: Option<i64>,
}

/// OAuth client performing the refresh-token exchange.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    credentials: OAuthCredentials,
    token_url: String,
    scope: String,
    http_client: reqwest::Client,
}

impl OAuthClient {
    /// Creates a new OAuth client sharing the given HTTP client.
    pub fn new(
        credentials: OAuthCredentials,
        token_url: impl Into<String>,
        scope: impl Into<String>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            credentials,
            token_url: token_url.into(),
            scope: scope.into(),
            http_client,
        }
    }

    /// Returns the token endpoint.
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Exchanges the refresh token for a new access token.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> ProviderResult<TokenGrant> {
        if !self.credentials.is_complete() {
            return Err(ProviderError::configuration(
                "client id and client secret are required for token exchange",
            ));
        }

        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
            ("scope", self.scope.as_str()),
        ];

        debug!(token_url = %self.token_url, "requesting access token");

        let response = self
            .http_client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                ProviderError::network(format!("token refresh request failed: {}", e)).with_source(e)
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(ProviderError::authentication(format!(
                "token refresh failed ({}): {}",
                status,
                body.trim()
            )));
        }

        let token_response: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("invalid token response: {}", e))
        })?;

        info!(expires_in = ?token_response.expires_in, "obtained access token");
        Ok(TokenGrant {
            access_token: token_response.access_token,
            expires_in: token_response.expires_in,
        })
    }
}
