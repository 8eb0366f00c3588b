//! Outbound calls to a registering counterpart.
//!
//! Both fetches are single-shot GETs carrying `Authorization: Token <t>`
//! and expecting an OCPI envelope `{"data": ...}`. There is no retry here;
//! the caller decides whether to try again.

use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use reqwest::{header, Client};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::credentials::redact;
use crate::versions::{VersionCatalog, VersionDetails, VersionEntry};

/// Default per-call timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Counterpart call failures.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Connection could not be made or was dropped.
    #[error("counterpart unreachable: {0}")]
    Unreachable(String),

    /// The call did not complete within the configured timeout.
    #[error("counterpart timed out after {0:?}")]
    Timeout(Duration),

    /// Counterpart answered with a non-success HTTP status.
    #[error("counterpart rejected request with HTTP {0}")]
    RejectedStatus(u16),

    /// Body did not have the expected shape.
    #[error("malformed counterpart response: {0}")]
    MalformedResponse(String),
}

/// Fetches version and endpoint listings from a counterpart.
pub trait CounterpartClient: Send + Sync {
    /// GET the versions listing at `base_url`.
    fn fetch_versions<'a>(
        &'a self,
        base_url: &'a str,
        bearer_token: &'a str,
    ) -> BoxFuture<'a, Result<VersionCatalog, ClientError>>;

    /// GET the version details at `version_url`.
    fn fetch_endpoints<'a>(
        &'a self,
        version_url: &'a str,
        bearer_token: &'a str,
    ) -> BoxFuture<'a, Result<VersionDetails, ClientError>>;
}

#[derive(Deserialize)]
struct Envelope {
    data: Value,
}

/// reqwest-backed client.
#[derive(Debug, Clone)]
pub struct HttpCounterpartClient {
    client: Client,
    timeout: Duration,
}

impl HttpCounterpartClient {
    /// Create a client with the given per-call timeout
    pub fn new(timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Unreachable(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, timeout })
    }

    /// Configured timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn get_data(&self, url: &str, bearer_token: &str) -> Result<Value, ClientError> {
        tracing::debug!(url, token = %redact(bearer_token), "GET counterpart");

        let response = self
            .client
            .get(url)
            .header(header::AUTHORIZATION, format!("Token {bearer_token}"))
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::RejectedStatus(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let envelope: Envelope = serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::MalformedResponse(format!("invalid envelope: {e}")))?;
        Ok(envelope.data)
    }

    fn transport_error(&self, err: &reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(self.timeout)
        } else {
            ClientError::Unreachable(err.to_string())
        }
    }
}

impl CounterpartClient for HttpCounterpartClient {
    fn fetch_versions<'a>(
        &'a self,
        base_url: &'a str,
        bearer_token: &'a str,
    ) -> BoxFuture<'a, Result<VersionCatalog, ClientError>> {
        async move {
            let data = self.get_data(base_url, bearer_token).await?;
            parse_catalog(data)
        }
        .boxed()
    }

    fn fetch_endpoints<'a>(
        &'a self,
        version_url: &'a str,
        bearer_token: &'a str,
    ) -> BoxFuture<'a, Result<VersionDetails, ClientError>> {
        async move {
            let data = self.get_data(version_url, bearer_token).await?;
            parse_details(data)
        }
        .boxed()
    }
}

/// Parse the `data` of a versions response.
pub fn parse_catalog(data: Value) -> Result<VersionCatalog, ClientError> {
    let entries: Vec<VersionEntry> = serde_json::from_value(data)
        .map_err(|e| ClientError::MalformedResponse(format!("invalid version list: {e}")))?;
    VersionCatalog::new(entries).map_err(ClientError::MalformedResponse)
}

/// Parse the `data` of a version details response.
///
/// Accepts a list (first element is used) or a bare object.
pub fn parse_details(data: Value) -> Result<VersionDetails, ClientError> {
    let details = match data {
        Value::Array(items) => items.into_iter().next().ok_or_else(|| {
            ClientError::MalformedResponse("empty version details list".to_string())
        })?,
        other => other,
    };

    serde_json::from_value(details)
        .map_err(|e| ClientError::MalformedResponse(format!("invalid version details: {e}")))
}
