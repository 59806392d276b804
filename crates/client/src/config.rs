//! Endpoint settings, read from the environment.

use std::time::Duration;

pub const API_URL_VAR: &str = "AUTOSHOP_API_URL";
pub const POSTAL_CODE_URL_VAR: &str = "AUTOSHOP_POSTAL_CODE_URL";
pub const PLATE_API_URL_VAR: &str = "AUTOSHOP_PLATE_API_URL";
pub const PLATE_API_TOKEN_VAR: &str = "AUTOSHOP_PLATE_API_TOKEN";
pub const HTTP_TIMEOUT_VAR: &str = "AUTOSHOP_HTTP_TIMEOUT_SECS";

const DEFAULT_API_URL: &str = "http://localhost:8080/api";
const DEFAULT_POSTAL_CODE_URL: &str = "https://viacep.com.br/ws";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Shop backend base URL (customers, vehicles, service orders).
    pub api_url: String,
    pub postal_code_url: String,
    /// External plate provider; without it only the shop's own vehicles are found.
    pub plate_api_url: Option<String>,
    pub plate_api_token: Option<String>,
    pub http_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            postal_code_url: DEFAULT_POSTAL_CODE_URL.to_string(),
            plate_api_url: None,
            plate_api_token: None,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Blank values count as unset; a malformed timeout falls back to the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let url = |key: &str| read(key).map(|value| value.trim_end_matches('/').to_string());

        let defaults = Self::default();
        let http_timeout = match read(HTTP_TIMEOUT_VAR) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    tracing::warn!(value = %raw, "invalid {HTTP_TIMEOUT_VAR}; using default");
                    defaults.http_timeout
                }
            },
            None => defaults.http_timeout,
        };

        Self {
            api_url: url(API_URL_VAR).unwrap_or(defaults.api_url),
            postal_code_url: url(POSTAL_CODE_URL_VAR).unwrap_or(defaults.postal_code_url),
            plate_api_url: url(PLATE_API_URL_VAR),
            plate_api_token: read(PLATE_API_TOKEN_VAR),
            http_timeout,
        }
    }

    /// Shared HTTP client for every endpoint.
    pub fn http_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .user_agent(concat!("autoshop-client/", env!("CARGO_PKG_VERSION")))
            .timeout(self.http_timeout)
            .build()
    }
}
