//! Command-line interface definition.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use weekender_core::{TracingConfig, TracingOutputFormat};

use crate::config::{ServerConfig, VenueFile};
use crate::error::ServerResult;

/// weekender - weekend availability for rentable venues
#[derive(Debug, Parser)]
#[command(name = "weekender")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, env = "WEEKENDER_BIND", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    /// Directory with index.html and static assets
    #[arg(long, env = "WEEKENDER_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    /// TOML file of [[venue]] tables (built-in venues when absent)
    #[arg(long, env = "WEEKENDER_VENUES")]
    pub venues: Option<PathBuf>,

    /// Seconds between calendar refreshes
    #[arg(long, env = "WEEKENDER_REFRESH_INTERVAL_SECS", default_value_t = 14_400)]
    pub refresh_interval_secs: u64,

    // --- Calendar provider ---
    /// OAuth client ID
    #[arg(long, env = "MS_CLIENT_ID", hide_env_values = true)]
    pub client_id: Option<String>,

    /// OAuth client secret
    #[arg(long, env = "MS_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// OAuth refresh token
    #[arg(long, env = "MS_REFRESH_TOKEN", hide_env_values = true)]
    pub refresh_token: Option<String>,

    /// Override the OAuth token endpoint
    #[arg(long)]
    pub token_url: Option<String>,

    /// Override the calendar API base URL
    #[arg(long)]
    pub api_base: Option<String>,

    // --- Logging ---
    /// Log format: pretty, compact or json
    #[arg(long, default_value = "json")]
    pub log_format: TracingOutputFormat,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,
}

impl Cli {
    pub fn tracing_config(&self) -> TracingConfig {
        TracingConfig::for_service(self.log_format, self.debug)
    }

    /// Builds the server configuration, loading the venue file if one is given.
    pub fn server_config(&self) -> ServerResult<ServerConfig> {
        let mut config = ServerConfig::default()
            .with_bind(self.bind)
            .with_static_dir(&self.static_dir)
            .with_refresh_interval(Duration::from_secs(self.refresh_interval_secs));

        if let Some(ref path) = self.venues {
            config = config.with_venues(VenueFile::load_from(path)?.to_venues()?);
        }
        config.validate()?;
        Ok(config)
    }

    /// Builds the calendar provider configuration.
    #[cfg(feature = "graph")]
    pub fn graph_config(&self) -> weekender_providers::graph::GraphConfig {
        use weekender_providers::graph::{GraphConfig, OAuthCredentials};

        let credentials = OAuthCredentials::new(
            self.client_id.clone().unwrap_or_default(),
            self.client_secret.clone().unwrap_or_default(),
        );
        let mut config = GraphConfig::new(credentials);
        if let Some(ref token) = self.refresh_token {
            config = config.with_refresh_token(token);
        }
        if let Some(ref url) = self.token_url {
            config = config.with_token_url(url);
        }
        if let Some(ref base) = self.api_base {
            config = config.with_api_base(base);
        }
        config
    }
}
