//! Shopify Admin API transport with rate-limit handling.
//!
//! # Architecture
//!
//! The module uses a trait-based design so the retry policy can wrap any
//! transport:
//! - [`SendRequest`]: core trait, one request in, one buffered response out
//! - [`HttpSender`]: `reqwest` implementation that authenticates every call
//! - [`RateLimited`]: decorator that retries `429 Too Many Requests`
//!
//! # Retry Strategy
//!
//! Only rate limiting is retried. The wait comes from the server's
//! `Retry-After` header (seconds, integer or decimal) and falls back to a
//! configured default when the header is missing or unreadable. There is no
//! exponential growth and no jitter: the server says how long to wait.
//! Every other status is handed back to the caller untouched.

use crate::config::Config;
use reqwest::header::{CONTENT_TYPE, HeaderMap, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

/// Header carrying the Admin API access token.
const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// A request that can be sent (and re-sent) verbatim.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn put(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::PUT,
            url: url.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }
}

/// A fully read response. The body is buffered so it can be logged on failure.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Trait for sending one request to the Admin API.
///
/// Implementors return every HTTP status as a response; only transport
/// failures (DNS, TLS, connection reset, body read) are errors.
pub trait SendRequest {
    /// Send one request and buffer the whole response.
    ///
    /// # Arguments
    ///
    /// * `request` - Method, URL, query pairs and optional JSON body
    ///
    /// # Returns
    ///
    /// The response for any HTTP status, or the transport error.
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, reqwest::Error>;
}

/// `reqwest`-backed transport that attaches the access token to every call.
pub struct HttpSender {
    client: reqwest::Client,
    token: String,
}

impl HttpSender {
    /// Build a sender that authenticates with `token`.
    ///
    /// # Errors
    ///
    /// Fails only if the TLS backend cannot be initialised.
    pub fn new(token: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            token: token.into(),
        })
    }
}

impl fmt::Debug for HttpSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSender")
            .field("token", &"<redacted>")
            .finish()
    }
}

impl SendRequest for HttpSender {
    #[instrument(level = "debug", skip_all, fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, reqwest::Error> {
        let t0 = Instant::now();
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .header(ACCESS_TOKEN_HEADER, &self.token)
            .header(CONTENT_TYPE, "application/json");
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        debug!(
            %status,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u128,
            "Admin API call finished"
        );
        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}

/// Decorator that retries rate-limited requests after the server-directed delay.
pub struct RateLimited<T> {
    /// The underlying transport to wrap.
    inner: T,
    /// Wait used when a 429 carries no usable `Retry-After`.
    default_retry_after: Duration,
    /// Maximum number of retries; `None` keeps retrying until the limit lifts.
    max_retries: Option<usize>,
}

impl<T> RateLimited<T>
where
    T: SendRequest,
{
    /// Create a rate-limit wrapper around an existing [`SendRequest`] implementation.
    ///
    /// # Arguments
    ///
    /// * `inner` - The underlying transport to wrap
    /// * `default_retry_after` - Wait used when a 429 has no usable `Retry-After` (5 seconds recommended)
    /// * `max_retries` - Retry cap; `None` waits out the limit however long it lasts
    ///
    /// # Example
    ///
    /// ```ignore
    /// let sender = HttpSender::new(token)?;
    /// let client = RateLimited::new(sender, Duration::from_secs(5), None);
    /// ```
    pub fn new(inner: T, default_retry_after: Duration, max_retries: Option<usize>) -> Self {
        Self {
            inner,
            default_retry_after,
            max_retries,
        }
    }
}

impl<T> fmt::Debug for RateLimited<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimited")
            .field("default_retry_after", &self.default_retry_after)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl<T> SendRequest for RateLimited<T>
where
    T: SendRequest,
{
    #[instrument(level = "debug", skip_all, fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, reqwest::Error> {
        let total_t0 = Instant::now();
        let mut retries = 0usize;

        loop {
            let response = self.inner.send(request).await?;
            if response.status != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }

            if self.max_retries.is_some_and(|max| retries >= max) {
                error!(
                    retries,
                    elapsed_ms_total = total_t0.elapsed().as_millis() as u128,
                    "Rate limit retries exhausted; returning 429 to caller"
                );
                return Ok(response);
            }

            retries += 1;
            let delay = retry_after(&response.headers, self.default_retry_after);
            warn!(attempt = retries, ?delay, "Rate limit exceeded; retrying after delay");
            sleep(delay).await;
        }
    }
}

/// Client used by a run: authenticated transport behind the rate-limit policy.
pub type ShopifyClient = RateLimited<HttpSender>;

/// Build the client described by `config`.
pub fn client_from_config(config: &Config) -> Result<ShopifyClient, reqwest::Error> {
    Ok(RateLimited::new(
        HttpSender::new(config.token.clone())?,
        config.default_retry_after,
        config.max_rate_limit_retries,
    ))
}

/// Read the `Retry-After` header as a delay in seconds.
///
/// Accepts integer and decimal values. Anything else (missing header,
/// HTTP-date form, negative or non-finite numbers) yields `default`.
///
/// # Example
///
/// ```ignore
/// headers.insert(RETRY_AFTER, HeaderValue::from_static("1.5"));
/// assert_eq!(retry_after(&headers, Duration::from_secs(5)), Duration::from_millis(1500));
/// ```
pub fn retry_after(headers: &HeaderMap, default: Duration) -> Duration {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64)
        .unwrap_or(default)
}
