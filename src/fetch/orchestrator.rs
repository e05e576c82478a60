//! Fetch strategy selection and execution
//!
//! # Request Flow
//!
//! 1. `render = force` → rendered fetch only
//! 2. `render = never` → direct fetch only, never escalated
//! 3. `render = auto` → direct fetch first, then a rendered fetch when
//!    - the response looks like an empty script-rendered shell, or
//!    - the direct fetch failed with a retryable error
//!
//! A rendered fetch that crashes its browser session is retried once on a
//! fresh session.

use crate::browser::{RenderedDom, SessionPool};
use crate::config::EscalationConfig;
use crate::fetch::{escalation_reason, DirectFetcher, FetchRequest, FetchStrategy, RawPage};
use crate::{BrowserError, FetchError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Caller's choice of fetch strategy
///
/// Deserializes from `"auto"`, `"force"` or `"never"`, or from a boolean:
/// `true` means force and `false` means never.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "RenderModeValue")]
pub enum RenderMode {
    /// Direct first, escalate when the response is insufficient
    #[default]
    Auto,
    /// Always render in a browser
    Force,
    /// Never start a browser
    Never,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RenderModeValue {
    Flag(bool),
    Name(String),
}

impl TryFrom<RenderModeValue> for RenderMode {
    type Error = String;

    fn try_from(value: RenderModeValue) -> Result<Self, Self::Error> {
        match value {
            RenderModeValue::Flag(true) => Ok(Self::Force),
            RenderModeValue::Flag(false) => Ok(Self::Never),
            RenderModeValue::Name(name) => name.parse(),
        }
    }
}

impl FromStr for RenderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "force" | "true" => Ok(Self::Force),
            "never" | "false" => Ok(Self::Never),
            other => Err(format!(
                "invalid render mode '{}', expected auto, force or never",
                other
            )),
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Force => f.write_str("force"),
            Self::Never => f.write_str("never"),
        }
    }
}

/// Runs the direct and rendered fetch paths for a request
#[derive(Clone)]
pub struct FetchOrchestrator {
    direct: DirectFetcher,
    pool: SessionPool,
    escalation: EscalationConfig,
}

impl FetchOrchestrator {
    pub fn new(direct: DirectFetcher, pool: SessionPool, escalation: EscalationConfig) -> Self {
        Self {
            direct,
            pool,
            escalation,
        }
    }

    pub fn pool(&self) -> &SessionPool {
        &self.pool
    }

    /// Retrieves the page for a request
    ///
    /// HTTP error statuses are returned as pages; only failures to obtain
    /// a response at all are errors.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<RawPage, FetchError> {
        let target = request.target();

        match request.render() {
            RenderMode::Force => return self.fetch_rendered(request).await,
            RenderMode::Never => return self.direct.fetch(target).await,
            RenderMode::Auto => {}
        }

        match self.direct.fetch(target).await {
            Ok(page) => match escalation_reason(&page, &self.escalation) {
                None => Ok(page),
                Some(reason) => {
                    tracing::info!(url = %target, reason = %reason, "Escalating to rendered fetch");
                    self.fetch_rendered(request).await
                }
            },
            Err(e) if e.is_retryable() => {
                tracing::warn!(url = %target, error = %e, "Direct fetch failed, escalating to rendered fetch");
                self.fetch_rendered(request).await
            }
            Err(e) => Err(e),
        }
    }

    async fn fetch_rendered(&self, request: &FetchRequest) -> Result<RawPage, FetchError> {
        let url = request.target().as_str();
        let mut retried = false;

        loop {
            match self.render_once(url).await {
                Ok(dom) => return Ok(rendered_page(url, dom)),
                Err(e) if e.is_crash() && !retried => {
                    retried = true;
                    tracing::warn!(url, error = %e, "Browser session crashed, retrying on a fresh session");
                }
                Err(source) => {
                    return Err(FetchError::Render {
                        url: url.to_string(),
                        source,
                    })
                }
            }
        }
    }

    async fn render_once(&self, url: &str) -> Result<RenderedDom, BrowserError> {
        let config = self.pool.config();
        let mut guard = self.pool.acquire(config.acquire_timeout()).await?;
        tracing::debug!(url, session = ?guard.session_id(), "Rendering page");
        let result = self
            .pool
            .navigate(&mut guard, url, config.navigation_timeout())
            .await;
        self.pool.release(guard);
        result
    }
}

fn rendered_page(source_url: &str, dom: RenderedDom) -> RawPage {
    let final_url = if dom.final_url.is_empty() || dom.final_url == "about:blank" {
        source_url.to_string()
    } else {
        dom.final_url
    };

    RawPage {
        source_url: source_url.to_string(),
        final_url,
        status_code: 200,
        content_type: "text/html".to_string(),
        html_body: dom.html,
        fetched_via: FetchStrategy::Rendered,
    }
}
