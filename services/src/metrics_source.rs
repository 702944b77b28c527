//! HTTP client for the agent that publishes the metrics document.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::error::FetchError;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Issues a single bounded GET per call. Retrying is left to the next scheduler tick.
#[derive(Clone, Debug)]
pub struct MetricsSourceClient {
    client: Client,
    url: String,
}

impl MetricsSourceClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Reuses an already configured client, e.g. the one held in `AppState`.
    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetches and decodes the JSON body; any non-2xx status is an error.
    pub async fn fetch(&self) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status,
            });
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                self.transport_error(e)
            } else {
                FetchError::Decode {
                    url: self.url.clone(),
                    source: e,
                }
            }
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout {
                url: self.url.clone(),
            }
        } else {
            FetchError::Transport {
                url: self.url.clone(),
                source: e,
            }
        }
    }
}
