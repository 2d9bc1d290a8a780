//! Client configuration (layered: code > env > config file).

use std::time::Duration;

use bon::Builder;
use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_REFRESH_PATH: &str = "/api/refresh";
pub const DEFAULT_IDENTITY_PATH: &str = "/api/session";

const ENV_BASE_URL: &str = "BLOODLINK_API_URL";
const ENV_TIMEOUT_SECS: &str = "BLOODLINK_TIMEOUT_SECS";

/// Backend location and request tuning for [`AuthenticatedClient`](crate::client::AuthenticatedClient).
///
/// # Example
/// ```
/// use std::time::Duration;
/// use bloodlink::config::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("https://donate.example.org")
///     .timeout(Duration::from_secs(10))
///     .build();
/// assert_eq!(config.refresh_path, "/api/refresh");
/// ```
#[derive(Debug, Clone, Builder)]
pub struct ClientConfig {
    /// Scheme and host, without a trailing slash. Request paths are appended verbatim.
    #[builder(into)]
    pub base_url: String,
    #[builder(default = DEFAULT_TIMEOUT)]
    pub timeout: Duration,
    #[builder(into, default = String::from(DEFAULT_REFRESH_PATH))]
    pub refresh_path: String,
    /// Endpoint the session observer uses to re-fetch the signed-in identity.
    #[builder(into, default = String::from(DEFAULT_IDENTITY_PATH))]
    pub identity_path: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::builder().base_url(DEFAULT_BASE_URL).build()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    refresh_path: Option<String>,
    identity_path: Option<String>,
}

impl ClientConfig {
    /// Load from environment variables (`BLOODLINK_API_URL`, `BLOODLINK_TIMEOUT_SECS`).
    ///
    /// A `.env` file in the working directory is read first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv(); // missing .env is fine
        Self::default().with_env_overrides()
    }

    /// Parse a TOML config file body, then apply environment overrides.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let file: FileConfig = toml::from_str(raw)?;
        let mut config = Self::default();
        if let Some(base_url) = file.base_url {
            config.base_url = base_url;
        }
        if let Some(secs) = file.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(path) = file.refresh_path {
            config.refresh_path = path;
        }
        if let Some(path) = file.identity_path {
            config.identity_path = path;
        }
        config.with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(url) = std::env::var(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Ok(raw) = std::env::var(ENV_TIMEOUT_SECS) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|err| ConfigError::InvalidValue {
                    key: ENV_TIMEOUT_SECS.to_string(),
                    message: err.to_string(),
                })?;
            self.timeout = Duration::from_secs(secs);
        }
        self.validate()
    }

    fn validate(mut self) -> Result<Self, ConfigError> {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                key: "base_url".to_string(),
                message: format!("expected an http(s) URL, got {:?}", self.base_url),
            });
        }
        self.base_url = trimmed.to_string();
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "timeout".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(self)
    }

    /// Full URL for a backend path.
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }
}
