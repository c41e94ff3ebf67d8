use reqwest::header::ACCEPT;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::retry::{Outcome, RetryPolicy, classify};

pub const DEFAULT_BASE_URL: &str = "https://api.infakt.pl";
const API_KEY_HEADER: &str = "X-inFakt-ApiKey";
const API_PREFIX: &str = "/api/v3";

#[derive(Debug, Error)]
pub enum InfaktError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("invalid json from {url}: {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("exceeded {attempts} fetch attempts for {url} (last status {last_status})")]
    ExceededRetries {
        url: String,
        attempts: u32,
        last_status: StatusCode,
    },
    #[error("invalid listing page from {url}: {source}")]
    InvalidPage {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Clone)]
pub struct InfaktClient {
    http: Client,
    base_url: Url,
    api_key: String,
    retry: RetryPolicy,
}

impl InfaktClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, InfaktError> {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: &str, api_key: impl Into<String>) -> Result<Self, InfaktError> {
        Ok(Self {
            http: Client::new(),
            base_url: Url::parse(base_url)?,
            api_key: api_key.into(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn resource_url(&self, resource: &str) -> Result<Url, InfaktError> {
        let resource = resource.trim_matches('/');
        Ok(self
            .base_url
            .join(&format!("{API_PREFIX}/{resource}.json"))?)
    }

    pub async fn get_resource(&self, resource: &str) -> Result<Value, InfaktError> {
        let url = self.resource_url(resource)?;
        self.get_json(url).await
    }

    pub async fn get_json(&self, url: Url) -> Result<Value, InfaktError> {
        let response = self.execute(&url, true).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|source| InfaktError::Json {
            url: url.to_string(),
            source,
        })
    }

    pub async fn get_bytes(&self, link: &str) -> Result<Vec<u8>, InfaktError> {
        let url = self.base_url.join(link)?;
        let response = self.execute(&url, false).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn execute(&self, url: &Url, json: bool) -> Result<Response, InfaktError> {
        let with_key = url.origin() == self.base_url.origin();
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let mut request = self.http.get(url.clone());
            if json {
                request = request.header(ACCEPT, "application/json");
            }
            if with_key {
                request = request.header(API_KEY_HEADER, &self.api_key);
            }
            let response = request.send().await?;
            let status = response.status();
            let outcome = classify(status, response.headers());
            if outcome == Outcome::Success {
                return Ok(response);
            }

            if attempt >= self.retry.max_attempts {
                return Err(InfaktError::ExceededRetries {
                    url: url.to_string(),
                    attempts: attempt,
                    last_status: status,
                });
            }

            let delay = self.retry.delay_for(&outcome);
            match outcome {
                Outcome::RateLimited(_) => tracing::warn!(
                    url = %url,
                    attempt,
                    wait_secs = delay.as_secs_f64(),
                    "rate limited, waiting before retry"
                ),
                _ => tracing::warn!(
                    url = %url,
                    attempt,
                    status = status.as_u16(),
                    wait_secs = delay.as_secs_f64(),
                    "request failed, retrying"
                ),
            }
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}

impl InfaktError {
    pub fn is_retry_exhaustion(&self) -> bool {
        matches!(self, InfaktError::ExceededRetries { .. })
    }
}
