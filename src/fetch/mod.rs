//! Page retrieval
//!
//! This module retrieves the HTML for a target URL, either directly over
//! HTTP or through a rendered browser session:
//! - `direct`: reqwest-based fetch with manual redirects and bounded retries
//! - `strategy`: the escalation decision from a direct response
//! - `orchestrator`: strategy selection per request

mod direct;
mod orchestrator;
mod strategy;

pub use direct::{build_http_client, DirectFetcher};
pub use orchestrator::{FetchOrchestrator, RenderMode};
pub use strategy::{decide_strategy, escalation_reason, EscalationReason, FetchStrategy};

use std::time::Duration;
use url::Url;

/// A validated fetch, fixed for the lifetime of one request
#[derive(Debug, Clone)]
pub struct FetchRequest {
    target: Url,
    render: RenderMode,
    timeout: Duration,
    extract_markdown: bool,
}

impl FetchRequest {
    pub fn new(target: Url, render: RenderMode, timeout: Duration, extract_markdown: bool) -> Self {
        Self {
            target,
            render,
            timeout,
            extract_markdown,
        }
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    pub fn render(&self) -> RenderMode {
        self.render
    }

    /// Overall budget for the request, covering fetch and rendering
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn extract_markdown(&self) -> bool {
        self.extract_markdown
    }
}

/// A retrieved page, exactly as fetched
#[derive(Debug, Clone)]
pub struct RawPage {
    pub source_url: String,

    /// URL after redirects or in-browser navigation
    pub final_url: String,

    /// HTTP status; rendered pages report 200
    pub status_code: u16,

    /// Content-Type header value, empty if absent
    pub content_type: String,

    pub html_body: String,

    pub fetched_via: FetchStrategy,
}

impl RawPage {
    /// Returns true if the response carries an HTML document
    ///
    /// A missing Content-Type is accepted when the body looks like markup.
    pub fn is_html(&self) -> bool {
        let content_type = self.content_type.to_ascii_lowercase();
        if content_type.is_empty() {
            return self.html_body.trim_start().starts_with('<');
        }
        content_type.contains("text/html") || content_type.contains("application/xhtml+xml")
    }

    /// Returns true for 4xx and 5xx responses
    pub fn is_error_status(&self) -> bool {
        self.status_code >= 400
    }
}

#[cfg(test)]
pub(crate) fn test_page(status_code: u16, content_type: &str, html_body: &str) -> RawPage {
    RawPage {
        source_url: "https://example.com/page".to_string(),
        final_url: "https://example.com/page".to_string(),
        status_code,
        content_type: content_type.to_string(),
        html_body: html_body.to_string(),
        fetched_via: FetchStrategy::Direct,
    }
}
