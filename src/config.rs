//! Client configuration, read from the environment.
//!
//! | Variable               | Default                          |
//! |------------------------|----------------------------------|
//! | `PREDICT_URL`          | `http://127.0.0.1:5001/predict`  |
//! | `REQUEST_TIMEOUT_SECS` | unset (no timeout)               |
//! | `MAX_UPLOAD_MB`        | `5`                              |

use std::env;
use std::time::Duration;

use reqwest::Url;

use crate::error::ClientError;

pub const DEFAULT_PREDICT_URL: &str = "http://127.0.0.1:5001/predict";
pub const DEFAULT_MAX_UPLOAD_MB: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Full URL of the prediction endpoint
    pub predict_url: Url,

    /// Per-request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,

    /// Largest file accepted at intake, in MB
    pub max_upload_mb: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            predict_url: Url::parse(DEFAULT_PREDICT_URL).expect("default URL is valid"),
            timeout: None,
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Unset keys fall back to
    /// defaults, malformed ones are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("PREDICT_URL") {
            config.predict_url = parse_url(&url)?;
        }

        if let Some(secs) = lookup("REQUEST_TIMEOUT_SECS") {
            config.timeout = Some(parse_timeout(&secs)?);
        }

        if let Some(mb) = lookup("MAX_UPLOAD_MB") {
            config.max_upload_mb = mb.trim().parse::<usize>().map_err(|_| {
                ClientError::Config(format!("MAX_UPLOAD_MB must be a valid integer, got '{}'", mb))
            })?;
        }

        Ok(config)
    }

    pub fn with_predict_url(mut self, url: &str) -> Result<Self, ClientError> {
        self.predict_url = parse_url(url)?;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }

    /// Liveness probe served next to the prediction endpoint.
    pub fn health_url(&self) -> Url {
        let mut url = self.predict_url.clone();
        url.set_path("/health");
        url.set_query(None);
        url
    }
}

fn parse_url(raw: &str) -> Result<Url, ClientError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ClientError::Config(format!("PREDICT_URL '{}' is not a URL: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ClientError::Config(format!(
            "PREDICT_URL must use http or https, got '{}'",
            other
        ))),
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, ClientError> {
    let secs = raw.trim().parse::<u64>().map_err(|_| {
        ClientError::Config(format!(
            "REQUEST_TIMEOUT_SECS must be a whole number of seconds, got '{}'",
            raw
        ))
    })?;
    if secs == 0 {
        return Err(ClientError::Config(
            "REQUEST_TIMEOUT_SECS must be greater than zero".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}
