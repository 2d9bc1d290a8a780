//! reqwest client construction and header helpers.

use reqwest::header::{HeaderMap, HeaderValue, InvalidHeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::config::ClientConfig;
use crate::error::ConfigError;

/// Build the reqwest client used for every backend call.
pub fn build_client(config: &ClientConfig) -> Result<reqwest::Client, ConfigError> {
    Ok(reqwest::Client::builder()
        .timeout(config.timeout)
        .pool_max_idle_per_host(10)
        .build()?)
}

/// JSON headers, plus `Authorization: Bearer <token>` when a token is given.
///
/// Fails if the token cannot be carried in a header value.
pub fn json_headers(bearer: Option<&str>) -> Result<HeaderMap, InvalidHeaderValue> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(token) = bearer {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}
