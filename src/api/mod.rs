//! Wise API client
//!
//! A thin reqwest wrapper that attaches the bearer token, turns non-success
//! statuses into [`ApiError::Upstream`] and routes idempotent list requests
//! through the on-disk [`ResponseCache`]. The resource types and request
//! builders live in the submodules, one per API area.

mod profiles;
mod quotes;
mod recipients;
mod transfers;

pub use profiles::{Profile, User};
pub use quotes::{NewQuoteRequest, Notice, PaymentOption, Quote};
pub use recipients::{ListRecipientsRequest, NewRecipientRequest, Recipient, RecipientName};
pub use transfers::{ListTransfersRequest, NewTransferRequest, Transfer};

use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cache::{fingerprint, ResponseCache};

/// Errors that can occur when talking to the Wise API
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("API error (status {status}): {body}")]
    Upstream { status: u16, body: String },

    /// Failed to parse JSON response
    #[error("Failed to parse response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// The configured base URL and path do not form a valid URL
    #[error("Invalid API URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Status, headers and body of an HTTP response
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl RawResponse {
    /// Passes successful responses through and turns the rest into
    /// [`ApiError::Upstream`] carrying the status and body text
    pub fn into_success(self) -> Result<Self, ApiError> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(ApiError::Upstream {
                status: self.status.as_u16(),
                body: self.body,
            })
        }
    }
}

/// Where a response body handed out by [`cached_fetch`] came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    Cached(String),
    Network(String),
}

impl Fetched {
    pub fn body(&self) -> &str {
        match self {
            Fetched::Cached(body) | Fetched::Network(body) => body,
        }
    }

    pub fn into_body(self) -> String {
        match self {
            Fetched::Cached(body) | Fetched::Network(body) => body,
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, Fetched::Cached(_))
    }
}

/// Returns the cached body for `(resource, query)` or performs `fetch`
///
/// On a miss (or when `bypass` is set) the response from `fetch` must be
/// successful; its body is stored with an expiry derived from its headers.
/// Failing to store it only logs a warning.
pub async fn cached_fetch<F, Fut>(
    cache: &ResponseCache,
    resource: &str,
    query: &str,
    bypass: bool,
    fetch: F,
) -> Result<Fetched, ApiError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<RawResponse, ApiError>>,
{
    let key = fingerprint(resource, query);
    if let Some(body) = cache.read(&key, bypass) {
        return Ok(Fetched::Cached(body));
    }

    let response = fetch().await?.into_success()?;

    if let Err(err) = cache.write(&key, &response.body, &response.headers) {
        warn!("failed to cache {}: {}", resource, err);
    }

    Ok(Fetched::Network(response.body))
}

/// Query parameters kept in key order, so the encoded string is canonical
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<&'static str, String>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &'static str, value: impl ToString) -> &mut Self {
        self.0.insert(key, value.to_string());
        self
    }

    /// Sets `key` only when `value` is present
    pub fn set_opt<T: ToString>(&mut self, key: &'static str, value: Option<T>) -> &mut Self {
        if let Some(value) = value {
            self.set(key, value);
        }
        self
    }

    /// Appends the parameters to `url` as a form-urlencoded query
    pub fn apply(&self, url: &mut Url) {
        if self.0.is_empty() {
            return;
        }
        let mut pairs = url.query_pairs_mut();
        for (key, value) in &self.0 {
            pairs.append_pair(key, value);
        }
    }
}

/// Client for the Wise REST API
#[derive(Debug, Clone)]
pub struct ApiClient {
    http_client: Client,
    /// Base URL for the API (allows override for testing)
    base_url: String,
    token: String,
    cache: ResponseCache,
    /// Skip cached responses for this client's reads
    refresh: bool,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        cache: ResponseCache,
    ) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.into(),
            token: token.into(),
            cache,
            refresh: false,
        }
    }

    /// Bypasses cached responses when `refresh` is set
    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    /// Builds the full URL for `path` with `query` appended
    pub fn url(&self, path: &str, query: &QueryParams) -> Result<Url, ApiError> {
        let raw = format!("{}{}", self.base_url, path);
        let mut url = Url::parse(&raw).map_err(|e| ApiError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;
        query.apply(&mut url);
        Ok(url)
    }

    /// Sends an authenticated request and collects the whole response
    async fn send(&self, request: RequestBuilder) -> Result<RawResponse, ApiError> {
        let response = request
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "response received");

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }

    /// GETs `path` without caching and decodes the JSON body
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path, &QueryParams::new())?;
        debug!(%url, "GET");
        let response = self.send(self.http_client.get(url)).await?.into_success()?;
        Ok(serde_json::from_str(&response.body)?)
    }

    /// POSTs `body` as JSON to `path` and decodes the JSON response
    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path, &QueryParams::new())?;
        debug!(%url, "POST");
        let response = self
            .send(self.http_client.post(url).json(body))
            .await?
            .into_success()?;
        Ok(serde_json::from_str(&response.body)?)
    }

    /// GETs `path` through the response cache under `resource`
    ///
    /// A cached body that no longer decodes as `T` is discarded and fetched
    /// again from the network.
    async fn get_cached<T: DeserializeOwned>(
        &self,
        resource: &str,
        path: &str,
        query: &QueryParams,
    ) -> Result<T, ApiError> {
        let url = self.url(path, query)?;
        let canonical = url.query().unwrap_or_default().to_string();

        let fetched = cached_fetch(&self.cache, resource, &canonical, self.refresh, || {
            debug!(%url, "GET");
            self.send(self.http_client.get(url.clone()))
        })
        .await?;

        match serde_json::from_str(fetched.body()) {
            Ok(value) => Ok(value),
            Err(err) if fetched.is_cached() => {
                debug!(resource, error = %err, "cached response no longer decodes, refetching");
                let fetched = cached_fetch(&self.cache, resource, &canonical, true, || {
                    self.send(self.http_client.get(url.clone()))
                })
                .await?;
                Ok(serde_json::from_str(fetched.body())?)
            }
            Err(err) => Err(err.into()),
        }
    }
}
