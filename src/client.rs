use std::time::Duration;

use serde_json::Value;

use crate::config::Config;
use crate::error::FetchError;
use crate::record::{unwrap_rows, Endpoint};

/// Source of raw record arrays.
pub trait Backend: Send + Sync {
    fn get(&self, endpoint: Endpoint, query: &[(&str, String)]) -> Result<Vec<Value>, FetchError>;
}

/// Blocking HTTP client for the backend's `/main/*` views.
#[derive(Clone, Debug)]
pub struct HttpBackend {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| FetchError::Transport {
                url: base_url.clone(),
                message: err.to_string(),
            })?;
        Ok(Self { base_url, client })
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Self::new(config.backend_url.as_str(), config.timeout)
    }

    pub fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }
}

impl Backend for HttpBackend {
    fn get(&self, endpoint: Endpoint, query: &[(&str, String)]) -> Result<Vec<Value>, FetchError> {
        let url = self.url(endpoint);
        let _span = tracing::info_span!("fetch", url = url.as_str()).entered();

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .map_err(|err| {
                if err.is_timeout() {
                    FetchError::Timeout { url: url.clone() }
                } else {
                    FetchError::Transport {
                        url: url.clone(),
                        message: err.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body: Value = response.json().map_err(|err| {
            if err.is_timeout() {
                FetchError::Timeout { url: url.clone() }
            } else {
                FetchError::Body {
                    url: url.clone(),
                    reason: err.to_string(),
                }
            }
        })?;
        let rows = unwrap_rows(body).ok_or_else(|| FetchError::Body {
            url: url.clone(),
            reason: "expected an array of records".to_owned(),
        })?;
        log::debug!("{url}: {} rows", rows.len());
        Ok(rows)
    }
}
