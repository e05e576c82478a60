//! Linkwell: fetch a page, render it when it needs JavaScript, harvest its links
//!
//! This crate implements the fetch-render-extract pipeline behind a link
//! extraction service. A page is fetched over plain HTTP first and escalated
//! to a headless Chromium session when the response looks like an empty
//! script-rendered shell. The resulting HTML is mined for outbound links,
//! which are normalized into a deduplicated set, and optionally converted
//! to Markdown.

pub mod browser;
pub mod config;
pub mod extract;
pub mod fetch;
pub mod health;
pub mod markdown;
pub mod pipeline;
pub mod url;

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Failure kinds a request can terminate with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidUrl,
    Timeout,
    ConnectionFailed,
    TooManyRedirects,
    RenderFailed,
    NavigationTimeout,
    PoolExhausted,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidUrl => "invalid_url",
            Self::Timeout => "timeout",
            Self::ConnectionFailed => "connection_failed",
            Self::TooManyRedirects => "too_many_redirects",
            Self::RenderFailed => "render_failed",
            Self::NavigationTimeout => "navigation_timeout",
            Self::PoolExhausted => "pool_exhausted",
        }
    }

    /// Returns true if the same request may succeed when retried later
    ///
    /// Callers of the pipeline use this to tell upstream unavailability
    /// (retry with backoff) apart from bad input.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::ConnectionFailed | Self::NavigationTimeout | Self::PoolExhausted
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline stage that produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Input validation, before any network activity
    Validate,
    /// Direct HTTP fetch
    Fetch,
    /// Browser-rendered fetch
    Render,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validate => "validate",
            Self::Fetch => "fetch",
            Self::Render => "render",
        };
        f.write_str(name)
    }
}

/// Structured failure returned by [`pipeline::Pipeline::process`]
///
/// A request either yields a complete `ExtractionResult` or one of these;
/// partial results are never reported as success.
#[derive(Debug, Clone, Error, Serialize)]
#[error("{stage} stage failed ({kind}): {message}")]
pub struct PipelineError {
    pub stage: PipelineStage,
    pub kind: ErrorKind,
    pub message: String,
}

impl PipelineError {
    pub fn new(stage: PipelineStage, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_url(message: impl Into<String>) -> Self {
        Self::new(PipelineStage::Validate, ErrorKind::InvalidUrl, message)
    }
}

impl From<FetchError> for PipelineError {
    fn from(err: FetchError) -> Self {
        let stage = match err {
            FetchError::InvalidUrl { .. } => PipelineStage::Validate,
            FetchError::Render { .. } => PipelineStage::Render,
            _ => PipelineStage::Fetch,
        };
        Self::new(stage, err.kind(), err.to_string())
    }
}

impl From<UrlError> for PipelineError {
    fn from(err: UrlError) -> Self {
        Self::invalid_url(err.to_string())
    }
}

/// Errors produced while retrieving a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection to {url} failed: {message}")]
    ConnectionFailed { url: String, message: String },

    #[error("Too many redirects from {url} (limit {limit})")]
    TooManyRedirects { url: String, limit: usize },

    #[error("Redirect loop detected at {url}")]
    RedirectLoop { url: String },

    #[error("Rendering {url} failed: {source}")]
    Render {
        url: String,
        #[source]
        source: BrowserError,
    },
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidUrl { .. } => ErrorKind::InvalidUrl,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::ConnectionFailed { .. } => ErrorKind::ConnectionFailed,
            Self::TooManyRedirects { .. } | Self::RedirectLoop { .. } => {
                ErrorKind::TooManyRedirects
            }
            Self::Render { source, .. } => source.kind(),
        }
    }

    /// Returns true for connection-level failures that warrant another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::ConnectionFailed { .. })
    }
}

/// Errors produced by the browser session pool and its backends
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Browser session crashed: {0}")]
    Crashed(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Navigation to {url} did not complete within {timeout_ms}ms")]
    NavigationTimeout { url: String, timeout_ms: u64 },

    #[error("No browser session became available within {waited_ms}ms")]
    PoolExhausted { waited_ms: u64 },

    #[error("Browser pool has been shut down")]
    PoolClosed,
}

impl BrowserError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NavigationTimeout { .. } => ErrorKind::NavigationTimeout,
            Self::PoolExhausted { .. } => ErrorKind::PoolExhausted,
            Self::Launch(_) | Self::Crashed(_) | Self::Navigation { .. } | Self::PoolClosed => {
                ErrorKind::RenderFailed
            }
        }
    }

    /// Returns true if the session that produced this error is unusable
    pub fn is_crash(&self) -> bool {
        matches!(self, Self::Crashed(_))
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use fetch::FetchStrategy;
pub use pipeline::{ExtractOptions, ExtractRequest, ExtractionResult, Pipeline, RenderMode};
pub use url::{normalize, LinkSet, NormalizedUrl, Rejection};
