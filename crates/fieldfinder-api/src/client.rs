//! HTTP client for the fieldfinder REST backend.
//!
//! Wraps `reqwest` with base-URL handling, bearer credentials, status
//! mapping and tolerant list decoding. The collaborator trait
//! implementations live in [`crate::listings`] and [`crate::alerts`].

use std::time::Duration;

use fieldfinder_core::{AppConfig, Credentials};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::types::ListEnvelope;

/// Client for the fieldfinder REST API.
///
/// Use [`ApiClient::new`] with the production base URL, or point it at a
/// mock server in tests.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    credentials: Option<Credentials>,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl ApiClient {
    /// Creates a client rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed, or [`ApiError::InvalidBaseUrl`] if `base_url` is not
    /// an absolute http(s) URL.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("fieldfinder/0.1 (region-search)")
            .build()?;

        // Normalise to exactly one trailing slash so endpoint segments are
        // appended below the base path instead of replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| ApiError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidBaseUrl {
                url: base_url.to_owned(),
                reason: format!("unsupported scheme {}", parsed.scheme()),
            });
        }

        Ok(Self {
            client,
            base_url: parsed,
            credentials: None,
            max_retries: 0,
            backoff_base_ms: 0,
        })
    }

    /// Builds a client from application configuration, attaching the
    /// configured token (if any) and retry policy.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, ApiError> {
        Ok(Self::new(&config.api_base_url, config.request_timeout_secs)?
            .with_credentials(config.api_token.as_deref().map(Credentials::bearer))
            .with_retry(config.max_retries, config.retry_backoff_base_ms))
    }

    /// Credentials sent with listing reads and message sends. Alert calls
    /// always use the credentials passed to them explicitly.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    #[must_use]
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub(crate) fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub(crate) fn backoff_base_ms(&self) -> u64 {
        self.backoff_base_ms
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    /// Appends percent-encoded path segments to the base URL.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: "cannot be a base".to_owned(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) fn authorize(
        request: RequestBuilder,
        credentials: Option<&Credentials>,
    ) -> RequestBuilder {
        match credentials {
            Some(creds) => request.bearer_auth(creds.token()),
            None => request,
        }
    }

    /// Sends `request` and maps non-2xx statuses onto [`ApiError`].
    pub(crate) async fn send(request: RequestBuilder, url: &Url) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Unauthorized {
                url: url.to_string(),
            });
        }
        Err(ApiError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_string(),
        })
    }

    /// Reads the body as text and deserializes it, tagging failures with `context`.
    pub(crate) async fn read_json<T: DeserializeOwned>(
        response: Response,
        context: &str,
    ) -> Result<T, ApiError> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }

    /// Decodes each list item individually and skips the ones that fail, so
    /// one malformed record cannot hide the rest of the feed.
    pub(crate) fn decode_items<T: DeserializeOwned>(
        envelope: ListEnvelope,
        context: &str,
    ) -> Vec<T> {
        let items = envelope.into_items();
        let total = items.len();
        let decoded: Vec<T> = items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<T>(item) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::debug!(context, error = %e, "skipping malformed record");
                    None
                }
            })
            .collect();
        if decoded.len() < total {
            tracing::warn!(
                context,
                skipped = total - decoded.len(),
                total,
                "some records could not be decoded"
            );
        }
        decoded
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
