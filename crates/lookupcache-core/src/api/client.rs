//! HTTP client for the backend's lookup endpoints.
//!
//! This module provides the `ApiClient` struct, which implements
//! [`LookupApi`] over `reqwest`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use tracing::debug;

use super::{ApiError, LookupApi};
use crate::config::Config;
use crate::models::{Record, RecordId, TableKey};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// A request that never resolves would otherwise leave its channel loading
/// forever, so every call is bounded.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Path segment of the lookup resource under the API base URL
const LOOKUP_SEGMENT: &str = "lookup";

/// API client for the lookup endpoints.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: Option<Arc<str>>,
}

impl ApiClient {
    /// Create a new API client with the default request timeout
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid API base URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            bail!("API base URL cannot carry a path: {}", base_url);
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Build a client from the loaded configuration, including its token
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut client = Self::with_timeout(
            &config.api_url,
            Duration::from_secs(config.request_timeout_secs),
        )?;
        if let Some(token) = config.resolve_token() {
            client.set_token(token);
        }
        Ok(client)
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(Arc::from(token));
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(Arc::from(token)),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/lookup/{table}[/{id}]`, with each segment percent-encoded.
    fn lookup_url(&self, table: &TableKey, id: Option<&RecordId>) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ApiError::Other(format!("Invalid API base URL: {}", self.base_url)))?;
            segments.pop_if_empty().push(LOOKUP_SEGMENT).push(table.as_str());
            if let Some(id) = id {
                segments.push(id.as_str());
            }
        }
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(ApiError::from_transport)?;
        debug!(status = %response.status(), url = %response.url(), "Lookup API responded");
        Self::check_response(response).await
    }
}

#[async_trait]
impl LookupApi for ApiClient {
    async fn fetch_table(&self, table: &TableKey) -> Result<Vec<Record>, ApiError> {
        let url = self.lookup_url(table, None)?;
        let response = self.send(self.client.get(url)).await?;
        response.json().await.map_err(ApiError::from_transport)
    }

    async fn create_record(&self, table: &TableKey, record: &Record) -> Result<(), ApiError> {
        let url = self.lookup_url(table, None)?;
        self.send(self.client.post(url).json(record)).await?;
        Ok(())
    }

    async fn update_record(
        &self,
        table: &TableKey,
        id: &RecordId,
        record: &Record,
    ) -> Result<(), ApiError> {
        let url = self.lookup_url(table, Some(id))?;
        self.send(self.client.put(url).json(record)).await?;
        Ok(())
    }

    async fn delete_record(&self, table: &TableKey, id: &RecordId) -> Result<(), ApiError> {
        let url = self.lookup_url(table, Some(id))?;
        self.send(self.client.delete(url)).await?;
        Ok(())
    }
}
