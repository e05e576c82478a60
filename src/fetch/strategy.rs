//! Fetch strategy decision
//!
//! Decides, from a completed direct response alone, whether the page needs
//! a rendered fetch. Kept free of network and browser calls.

use crate::config::EscalationConfig;
use crate::extract::{body, visible_text, visible_text_len};
use crate::fetch::RawPage;
use crate::url::normalize;
use scraper::{Html, Selector};
use serde::Serialize;
use std::fmt;
use url::Url;

/// How a page was retrieved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStrategy {
    /// Plain HTTP request, no script execution
    Direct,
    /// DOM read back from a headless browser
    Rendered,
}

impl fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => f.write_str("direct"),
            Self::Rendered => f.write_str("rendered"),
        }
    }
}

/// Why a direct response was judged insufficient
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscalationReason {
    /// Body shorter than `min-body-bytes`
    BodyTooShort { bytes: usize, min: usize },

    /// No links and a framework mount point with no content
    EmptyShell { marker: String },

    /// No links and almost no visible text
    NoVisibleContent { chars: usize, min: usize },
}

impl fmt::Display for EscalationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BodyTooShort { bytes, min } => {
                write!(f, "body is {} bytes (minimum {})", bytes, min)
            }
            Self::EmptyShell { marker } => {
                write!(f, "no links and empty #{} mount point", marker)
            }
            Self::NoVisibleContent { chars, min } => {
                write!(f, "no links and {} visible characters (minimum {})", chars, min)
            }
        }
    }
}

/// Checks a direct response for signs of a script-rendered shell
///
/// # Rules
///
/// Only successful (status < 400) HTML responses are considered.
///
/// 1. Body shorter than `min-body-bytes` → escalate
/// 2. Page has anchor links that survive normalization → keep the direct
///    result (`#`, `javascript:` and `mailto:` anchors do not count)
/// 3. An element whose id is a shell marker has no visible text → escalate
/// 4. Visible body text shorter than `min-text-chars` → escalate
pub fn escalation_reason(page: &RawPage, config: &EscalationConfig) -> Option<EscalationReason> {
    if page.is_error_status() || !page.is_html() {
        return None;
    }

    let bytes = page.html_body.len();
    if bytes < config.min_body_bytes {
        return Some(EscalationReason::BodyTooShort {
            bytes,
            min: config.min_body_bytes,
        });
    }

    let document = Html::parse_document(&page.html_body);

    if has_navigable_anchor(&document, page) {
        return None;
    }

    if let Ok(with_id) = Selector::parse("[id]") {
        let empty_mount = document.select(&with_id).find(|el| {
            el.value()
                .id()
                .map_or(false, |id| config.shell_markers.iter().any(|m| m == id))
                && visible_text(*el).is_empty()
        });
        if let Some(el) = empty_mount {
            return Some(EscalationReason::EmptyShell {
                marker: el.value().id().unwrap_or_default().to_string(),
            });
        }
    }

    let chars = body(&document)
        .map(visible_text_len)
        .unwrap_or_else(|| visible_text_len(document.root_element()));
    if chars < config.min_text_chars {
        return Some(EscalationReason::NoVisibleContent {
            chars,
            min: config.min_text_chars,
        });
    }

    None
}

fn has_navigable_anchor(document: &Html, page: &RawPage) -> bool {
    let Ok(base) = Url::parse(&page.final_url).or_else(|_| Url::parse(&page.source_url)) else {
        return false;
    };
    let Ok(selector) = Selector::parse("a[href], area[href]") else {
        return false;
    };

    document
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .any(|href| normalize(href, &base).is_ok())
}

/// Chooses the strategy that should produce the final page
pub fn decide_strategy(page: &RawPage, config: &EscalationConfig) -> FetchStrategy {
    match escalation_reason(page, config) {
        Some(_) => FetchStrategy::Rendered,
        None => FetchStrategy::Direct,
    }
}
