//! GitHub API client
//!
//! Thin wrapper around `reqwest` that pins the headers GitHub expects and
//! hands back the raw body plus rate-limit telemetry. Status codes are
//! returned rather than raised because the pipeline treats the same status
//! differently depending on the stage.

use crate::Result;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use core::time::Duration;
use ohno::IntoAppError;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderMap};

const LOG_TARGET: &str = "    github";

/// REST API version pinned in every request.
const API_VERSION: &str = "2022-11-28";

/// How many body bytes error messages quote.
const SNIPPET_LEN: usize = 200;

/// Rate limit information from response headers
#[derive(Debug, Clone, Copy)]
pub struct RateLimitInfo {
    pub remaining: usize,
    pub reset_at: DateTime<Utc>,
}

/// One API response: status, rate-limit telemetry, and the raw body.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub rate_limit: Option<RateLimitInfo>,
    pub body: Bytes,
}

impl ApiResponse {
    /// Deserialize the body as JSON.
    pub fn json<T>(&self) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        serde_json::from_slice(&self.body).into_app_err("parsing API response body")
    }

    /// Leading bytes of the body, for quoting in error messages.
    #[must_use]
    pub fn body_snippet(&self) -> String {
        String::from_utf8_lossy(&self.body[..self.body.len().min(SNIPPET_LEN)]).into_owned()
    }

    /// Rate-limit remaining count as display text.
    #[must_use]
    pub fn rate_remaining(&self) -> String {
        self.rate_limit.map_or_else(|| "?".to_owned(), |rl| rl.remaining.to_string())
    }
}

/// GitHub API client with optional bearer authentication.
#[derive(Debug, Clone)]
pub struct Client {
    client: reqwest::Client,
    base_url: String,
}

impl Client {
    /// Create a new API client with optional authentication token and base URL.
    pub fn new(token: Option<&str>, base_url: impl Into<String>, user_agent: &str, timeout: Duration) -> Result<Self> {
        use reqwest::header::{AUTHORIZATION, HeaderValue};

        let mut headers = HeaderMap::new();
        let _ = headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        let _ = headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));

        if let Some(t) = token {
            let mut auth_val = HeaderValue::from_str(&format!("Bearer {t}"))?;
            auth_val.set_sensitive(true);
            let _ = headers.insert(AUTHORIZATION, auth_val);
        }

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            let _ = base_url.pop();
        }

        Ok(Self { client, base_url })
    }

    /// Get the base URL for this client
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a GET against an API path such as `/users/octocat`.
    ///
    /// HTTP error statuses come back as ordinary responses; only transport
    /// failures (connect, timeout, body read) are errors.
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<ApiResponse> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .into_app_err_with(|| format!("requesting {url}"))?;

        let status = response.status();
        let rate_limit = extract_rate_limit_from_headers(response.headers());
        let body = response
            .bytes()
            .await
            .into_app_err_with(|| format!("reading response body from {url}"))?;

        log::debug!(target: LOG_TARGET, "GET {path} status {status} ({} bytes)", body.len());

        Ok(ApiResponse { status, rate_limit, body })
    }
}

/// Extract rate limit information from API response headers
fn extract_rate_limit_from_headers(headers: &HeaderMap) -> Option<RateLimitInfo> {
    let remaining = headers.get("x-ratelimit-remaining")?.to_str().ok()?.parse::<usize>().ok()?;

    let reset_timestamp = headers.get("x-ratelimit-reset")?.to_str().ok()?.parse::<i64>().ok()?;

    let reset_at = DateTime::from_timestamp(reset_timestamp, 0)?;

    Some(RateLimitInfo { remaining, reset_at })
}
