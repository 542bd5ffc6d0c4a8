//! HTTP client for the domain availability check endpoint.
//!
//! The endpoint takes `domain=<name>.<suffix>&command=&token=<token>` and
//! answers with a small JSON document (see `DetectionResponse`). The client
//! only moves bytes; decoding and the availability decision live in the
//! detector so that a body is recorded even when it does not parse.

use crate::error::DomainSweepError;
use crate::protocols::AvailabilityApi;
use reqwest::Url;
use std::time::Duration;
use tracing::debug;

/// Default check endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://checkapi.aliyun.com/check/checkdomain";

/// Static token the endpoint expects.
pub const DEFAULT_TOKEN: &str = "Y";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Availability check API client.
#[derive(Clone, Debug)]
pub struct CheckApiClient {
    /// HTTP client for check requests
    http_client: reqwest::Client,
    /// Base URL of the check endpoint
    endpoint: Url,
    /// Token sent with every request
    token: String,
}

impl CheckApiClient {
    /// Create a client for the default endpoint.
    pub fn new() -> Result<Self, DomainSweepError> {
        Self::with_config(DEFAULT_ENDPOINT, DEFAULT_TOKEN, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom endpoint, token and timeout.
    pub fn with_config(
        endpoint: &str,
        token: &str,
        timeout: Duration,
    ) -> Result<Self, DomainSweepError> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            DomainSweepError::config(format!("Invalid check endpoint '{}': {}", endpoint, e))
        })?;

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                DomainSweepError::internal(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            endpoint,
            token: token.to_string(),
        })
    }

    /// Build the request URL for one candidate.
    pub fn check_url(&self, name: &str, suffix: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("domain", &format!("{}.{}", name, suffix))
            .append_pair("command", "")
            .append_pair("token", &self.token);
        url
    }
}

impl AvailabilityApi for CheckApiClient {
    async fn fetch(&self, name: &str, suffix: &str) -> Result<String, DomainSweepError> {
        let url = self.check_url(name, suffix);
        let domain = format!("{}.{}", name, suffix);

        let response = self.http_client.get(url).send().await?;
        debug!(domain = %domain, status = %response.status(), "check response");

        // Non-2xx bodies are recorded as-is, same as any other unparseable body.
        response.text().await.map_err(|e| {
            DomainSweepError::transport(domain, format!("failed to read body: {}", e))
        })
    }
}
