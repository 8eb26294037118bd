use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

use crate::auth::ApiToken;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

/// Connection settings for a NetBox server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the server, without the `/api` suffix.
    pub server_url: String,

    /// API token sent as `Authorization: Token <token>`.
    pub api_token: ApiToken,

    /// Accept invalid TLS certificates. Default: false.
    #[serde(default)]
    pub allow_insecure_https: bool,

    /// Per-request timeout in seconds. Default: 10.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Extra headers sent on every request.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl ClientConfig {
    /// Settings with defaults for everything but the server and token.
    pub fn new(server_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            api_token: ApiToken::new(api_token),
            allow_insecure_https: false,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            headers: BTreeMap::new(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|key| std::env::var(key))
    }

    /// Load configuration from a custom variable reader.
    ///
    /// This allows tests to supply variables without mutating process-global
    /// environment state.
    pub fn from_reader<F>(reader: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let server_url = reader("NETBOX_SERVER_URL")
            .map_err(|_| ConfigError::MissingVar("NETBOX_SERVER_URL".into()))?;

        let api_token = reader("NETBOX_API_TOKEN")
            .map_err(|_| ConfigError::MissingVar("NETBOX_API_TOKEN".into()))?;

        let allow_insecure_https = reader("NETBOX_ALLOW_INSECURE_HTTPS")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .map_err(|e| {
                ConfigError::InvalidValue("NETBOX_ALLOW_INSECURE_HTTPS".into(), e.to_string())
            })?;

        let request_timeout_secs = reader("NETBOX_REQUEST_TIMEOUT")
            .unwrap_or_else(|_| DEFAULT_REQUEST_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidValue("NETBOX_REQUEST_TIMEOUT".into(), e.to_string()))?;

        let headers = match reader("NETBOX_HEADERS") {
            Ok(raw) => parse_headers(&raw)?,
            Err(_) => BTreeMap::new(),
        };

        let config = Self {
            server_url,
            api_token: ApiToken::new(api_token),
            allow_insecure_https,
            request_timeout_secs,
            headers,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the settings without contacting the server.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.server_url)
            .map_err(|e| ConfigError::InvalidValue("NETBOX_SERVER_URL".into(), e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue(
                "NETBOX_SERVER_URL".into(),
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        if self.api_token.is_empty() {
            return Err(ConfigError::InvalidValue(
                "NETBOX_API_TOKEN".into(),
                "token must not be empty".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "NETBOX_REQUEST_TIMEOUT".into(),
                "timeout must be at least one second".into(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Parse `Name=Value` pairs separated by commas.
fn parse_headers(raw: &str) -> Result<BTreeMap<String, String>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = pair.split_once('=').ok_or_else(|| {
                ConfigError::InvalidValue(
                    "NETBOX_HEADERS".into(),
                    format!("expected Name=Value, got '{pair}'"),
                )
            })?;
            Ok((name.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(String),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}
