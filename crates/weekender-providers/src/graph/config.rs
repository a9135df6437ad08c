//! Microsoft Graph provider configuration.

use std::time::Duration;

use url::Url;

/// OAuth 2.0 client credentials of the registered Graph application.
#[derive(Debug, Clone, Default)]
pub struct OAuthCredentials {
    /// The application (client) ID.
    pub client_id: String,
    /// The client secret.
    pub client_secret: String,
}

impl OAuthCredentials {
    /// Creates new OAuth credentials.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Returns true if both the client ID and the secret are set.
    pub fn is_complete(&self) -> bool {
        !self.client_id.trim().is_empty() && !self.client_secret.trim().is_empty()
    }
}

/// Configuration for the Microsoft Graph provider.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// OAuth client credentials.
    pub credentials: OAuthCredentials,

    /// Long-lived refresh token exchanged for access tokens.
    ///
    /// Without it no access token can be obtained and every fetch yields an
    /// empty set.
    pub refresh_token: Option<String>,

    /// OAuth2 token endpoint.
    pub token_url: String,

    /// Base URL of the Graph API, without a trailing slash.
    pub api_base: String,

    /// Space-separated OAuth scopes requested on exchange.
    pub scope: String,

    /// Events requested per page (`$top`).
    pub page_size: u32,

    /// Request timeout.
    pub timeout: Duration,

    /// User agent string for API requests.
    pub user_agent: String,
}

impl GraphConfig {
    /// Default token endpoint for personal Microsoft accounts.
    pub const DEFAULT_TOKEN_URL: &'static str =
        "https://login.microsoftonline.com/consumers/oauth2/v2.0/token";

    /// Default Graph API base.
    pub const DEFAULT_API_BASE: &'static str = "https://graph.microsoft.com/v1.0";

    /// Default scope: read-only calendars plus a refresh token.
    pub const DEFAULT_SCOPE: &'static str = "offline_access Calendars.Read";

    /// Default page size.
    pub const DEFAULT_PAGE_SIZE: u32 = 500;

    /// Largest page size Graph accepts for event listings.
    pub const MAX_PAGE_SIZE: u32 = 1000;

    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Creates a new Graph configuration with the given credentials.
    pub fn new(credentials: OAuthCredentials) -> Self {
        Self {
            credentials,
            refresh_token: None,
            token_url: Self::DEFAULT_TOKEN_URL.to_string(),
            api_base: Self::DEFAULT_API_BASE.to_string(),
            scope: Self::DEFAULT_SCOPE.to_string(),
            page_size: Self::DEFAULT_PAGE_SIZE,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("weekender/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Sets the refresh token. Blank tokens count as unset.
    pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.refresh_token = (!token.trim().is_empty()).then_some(token);
        self
    }

    /// Sets the token endpoint.
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Sets the API base URL.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the OAuth scope.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Sets the page size.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Returns true if credentials and a refresh token are present.
    ///
    /// An unconfigured provider still works; it just never has a token.
    pub fn is_configured(&self) -> bool {
        self.credentials.is_complete() && self.refresh_token.is_some()
    }

    /// Validates the endpoint settings.
    ///
    /// Missing credentials are not an error here: they degrade to empty
    /// results at fetch time.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [("token_url", &self.token_url), ("api_base", &self.api_base)] {
            let url = Url::parse(value).map_err(|e| format!("invalid {}: {}", name, e))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(format!("{} must be an http(s) URL", name));
            }
        }

        if self.scope.trim().is_empty() {
            return Err("an OAuth scope is required".to_string());
        }

        if self.page_size == 0 || self.page_size > Self::MAX_PAGE_SIZE {
            return Err(format!(
                "page size must be between 1 and {}",
                Self::MAX_PAGE_SIZE
            ));
        }

        Ok(())
    }
}
