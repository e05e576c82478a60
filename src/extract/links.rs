//! Candidate link collection
//!
//! Walks the parsed document in order and records every reference the
//! caller asked for. Nothing is resolved here; the raw attribute value is
//! kept so normalization can report exactly what the page contained.

use crate::extract::text::visible_text;
use crate::extract::ExtractorOptions;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::sync::OnceLock;

/// Element kinds that can carry an outbound reference
const LINK_SELECTOR: &str = "a[href], area[href], link[href], img[src], script[src], \
     iframe[src], frame[src], source[src], video[src], audio[src], embed[src]";

/// Where a candidate link was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TagContext {
    /// `<a href>` or `<area href>`
    Anchor,
    /// `<link rel="canonical">`
    Canonical,
    /// `<link rel="alternate">`
    Alternate,
    /// `<link rel="stylesheet">`
    Stylesheet,
    /// `<link rel="icon">` and relatives
    Icon,
    Image,
    Script,
    /// `<iframe>` or `<frame>`
    Frame,
    /// `<source>`, `<video>`, `<audio>`, `<embed>`
    Media,
    /// URL written as visible text
    Text,
}

impl TagContext {
    /// Returns true for page resources as opposed to navigable links
    pub fn is_resource(&self) -> bool {
        matches!(
            self,
            Self::Stylesheet | Self::Icon | Self::Image | Self::Script | Self::Frame | Self::Media
        )
    }

    /// Returns true for `<link>` tags describing the page itself
    pub fn is_link_tag(&self) -> bool {
        matches!(self, Self::Canonical | Self::Alternate)
    }
}

/// A reference found in the page, in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLink {
    /// The attribute value exactly as written
    pub raw_href: String,

    /// Canonical absolute URL, filled in once the link has been normalized
    pub resolved_url: Option<String>,

    pub tag_context: TagContext,
}

impl CandidateLink {
    pub fn new(raw_href: impl Into<String>, tag_context: TagContext) -> Self {
        Self {
            raw_href: raw_href.into(),
            resolved_url: None,
            tag_context,
        }
    }
}

/// Collects href/src-bearing elements the options ask for
///
/// # Collection Rules
///
/// **Always:**
/// - `<a href>` and `<area href>`
///
/// **With `include_link_tags`:**
/// - `<link rel="canonical">`, `<link rel="alternate">`
///
/// **With `include_resources`:**
/// - `<img>`, `<script>`, `<iframe>`, `<frame>`, `<source>`, `<video>`,
///   `<audio>`, `<embed>` sources
/// - `<link>` stylesheets, icons, preloads
///
/// `rel="nofollow"` and `download` anchors are collected like any other.
pub fn collect_candidates(document: &Html, options: &ExtractorOptions) -> Vec<CandidateLink> {
    let mut links = Vec::new();

    let selector = match Selector::parse(LINK_SELECTOR) {
        Ok(selector) => selector,
        Err(_) => return links,
    };

    for element in document.select(&selector) {
        let Some((raw, context)) = classify(element) else {
            continue;
        };

        let wanted = if context.is_link_tag() {
            options.include_link_tags
        } else if context.is_resource() {
            options.include_resources
        } else {
            true
        };

        if wanted {
            links.push(CandidateLink::new(raw, context));
        }
    }

    links
}

/// Maps an element to its reference attribute and context
fn classify(element: ElementRef<'_>) -> Option<(&str, TagContext)> {
    let el = element.value();
    let context = match el.name() {
        "a" | "area" => TagContext::Anchor,
        "link" => link_context(el.attr("rel").unwrap_or_default())?,
        "img" => TagContext::Image,
        "script" => TagContext::Script,
        "iframe" | "frame" => TagContext::Frame,
        "source" | "video" | "audio" | "embed" => TagContext::Media,
        _ => return None,
    };

    let attr = match context {
        TagContext::Anchor
        | TagContext::Canonical
        | TagContext::Alternate
        | TagContext::Stylesheet
        | TagContext::Icon => "href",
        _ => "src",
    };

    el.attr(attr).map(|raw| (raw, context))
}

/// Classifies a `<link>` element by its space-separated rel tokens
fn link_context(rel: &str) -> Option<TagContext> {
    let mut context = None;
    for token in rel.split_ascii_whitespace() {
        let token = token.to_ascii_lowercase();
        match token.as_str() {
            "canonical" => return Some(TagContext::Canonical),
            "alternate" => context = Some(TagContext::Alternate),
            "stylesheet" | "preload" | "modulepreload" => {
                context = context.or(Some(TagContext::Stylesheet))
            }
            "icon" | "apple-touch-icon" | "mask-icon" => context = context.or(Some(TagContext::Icon)),
            _ => {}
        }
    }
    context
}

fn text_url_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r#"(?i)\b(?:https?://|www\.)[^\s<>"{}|\\^`\[\]]+"#).ok())
        .as_ref()
}

/// Finds URLs written as plain text in the visible body
///
/// Trailing sentence punctuation is stripped and bare `www.` hosts are
/// given an `https://` scheme.
pub fn scan_text_urls(document: &Html) -> Vec<CandidateLink> {
    let Some(pattern) = text_url_pattern() else {
        return Vec::new();
    };

    let text = visible_text(document.root_element());
    pattern
        .find_iter(&text)
        .filter_map(|m| {
            let cleaned = m.as_str().trim_end_matches(&['.', ',', ';', '!', '?', ')'][..]);
            if cleaned.is_empty() {
                return None;
            }
            let href = if cleaned.len() >= 4 && cleaned[..4].eq_ignore_ascii_case("www.") {
                format!("https://{}", cleaned)
            } else {
                cleaned.to_string()
            };
            Some(CandidateLink::new(href, TagContext::Text))
        })
        .collect()
}
