//! Direct HTTP fetcher
//!
//! This module handles plain HTTP retrieval, including:
//! - Building HTTP clients with the configured user agent and timeouts
//! - Manual redirect following with loop detection and a hop limit
//! - Retry with fixed backoff on connection-level failures
//! - A global cap on concurrent outbound fetches
//!
//! HTTP error statuses are not failures here; they are passed through in
//! the returned [`RawPage`].

use crate::config::{FetchConfig, UserAgentConfig};
use crate::fetch::{FetchStrategy, RawPage};
use crate::FetchError;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{redirect::Policy, Client};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```
/// use linkwell::config::{FetchConfig, UserAgentConfig};
/// use linkwell::fetch::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default(), &UserAgentConfig::default());
/// assert!(client.is_ok());
/// ```
pub fn build_http_client(
    fetch: &FetchConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(fetch.timeout())
        .connect_timeout(fetch.connect_timeout())
        .redirect(Policy::none()) // Handle redirects manually
        .gzip(true)
        .brotli(true)
        .build()
}

/// Plain HTTP fetcher shared by all requests
#[derive(Debug, Clone)]
pub struct DirectFetcher {
    client: Client,
    config: FetchConfig,
    connections: Arc<Semaphore>,
}

impl DirectFetcher {
    pub fn new(fetch: &FetchConfig, user_agent: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(fetch, user_agent)?,
            config: fetch.clone(),
            connections: Arc::new(Semaphore::new(fetch.max_outbound_connections)),
        })
    }

    /// Fetches a URL with retry and redirect handling
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 4xx/5xx | Returned as-is in `RawPage` |
    /// | Timeout | Retry up to `retries` times, fixed backoff |
    /// | Connection refused/reset | Retry up to `retries` times, fixed backoff |
    /// | Redirect loop | Immediate `RedirectLoop` |
    /// | Redirect chain > `max-redirects` | Immediate `TooManyRedirects` |
    pub async fn fetch(&self, url: &Url) -> Result<RawPage, FetchError> {
        let _permit = self
            .connections
            .acquire()
            .await
            .map_err(|_| FetchError::ConnectionFailed {
                url: url.to_string(),
                message: "outbound connection limiter closed".to_string(),
            })?;

        let mut attempt = 0;
        loop {
            match self.fetch_once(url).await {
                Ok(page) => return Ok(page),
                Err(e) if e.is_retryable() && attempt < self.config.retries => {
                    attempt += 1;
                    tracing::warn!(
                        url = %url,
                        attempt,
                        error = %e,
                        "Direct fetch failed, retrying"
                    );
                    tokio::time::sleep(self.config.retry_backoff()).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, url: &Url) -> Result<RawPage, FetchError> {
        let mut current = url.clone();
        let mut visited = HashSet::new();
        visited.insert(current.to_string());
        let mut hops = 0;

        loop {
            tracing::debug!(url = %current, "GET");
            let response = self
                .client
                .get(current.clone())
                .send()
                .await
                .map_err(|e| classify_error(&current, e))?;

            let status = response.status();

            let location = status
                .is_redirection()
                .then(|| response.headers().get(LOCATION))
                .flatten()
                .and_then(|v| v.to_str().ok());

            if let Some(location) = location {
                let next = current
                    .join(location)
                    .map_err(|e| FetchError::ConnectionFailed {
                        url: current.to_string(),
                        message: format!("invalid redirect location '{}': {}", location, e),
                    })?;

                if next.scheme() != "http" && next.scheme() != "https" {
                    return Err(FetchError::ConnectionFailed {
                        url: current.to_string(),
                        message: format!("redirect to unsupported scheme: {}", next.scheme()),
                    });
                }

                if !visited.insert(next.to_string()) {
                    return Err(FetchError::RedirectLoop {
                        url: next.to_string(),
                    });
                }

                hops += 1;
                if hops > self.config.max_redirects {
                    return Err(FetchError::TooManyRedirects {
                        url: url.to_string(),
                        limit: self.config.max_redirects,
                    });
                }

                tracing::debug!(from = %current, to = %next, status = status.as_u16(), "Following redirect");
                current = next;
                continue;
            }

            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string();

            let final_url = response.url().to_string();
            let html_body = response
                .text()
                .await
                .map_err(|e| classify_error(&current, e))?;

            return Ok(RawPage {
                source_url: url.to_string(),
                final_url,
                status_code: status.as_u16(),
                content_type,
                html_body,
                fetched_via: FetchStrategy::Direct,
            });
        }
    }
}

/// Maps a reqwest error onto the fetch failure taxonomy
fn classify_error(url: &Url, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::ConnectionFailed {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
