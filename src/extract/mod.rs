//! HTML extraction module
//!
//! This module turns a raw HTML body into:
//! - Candidate links, in document order, with the context they appeared in
//! - The principal content region, as an HTML fragment for conversion
//! - The visible text of that region
//! - Page metadata (title, description, headings, images, tables)
//! - Parse warnings for anything that had to be skipped or repaired
//!
//! Parsing never fails: malformed markup is repaired by the HTML5 parser
//! and the repair is recorded as a warning.

mod content;
mod links;
mod metadata;
mod text;

pub use content::{body, main_content, ContentRegion, RegionSource};
pub use links::{collect_candidates, scan_text_urls, CandidateLink, TagContext};
pub use metadata::{extract_metadata, Heading, ImageInfo, PageMetadata, TableInfo};
pub use text::{collapse_whitespace, visible_text, visible_text_len};

use crate::config::ExtractionConfig;
use scraper::{Html, Selector};
use serde::Serialize;
use url::Url;

/// Non-fatal issue recorded while processing a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    pub message: String,
}

impl ParseWarning {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Which references the extractor collects
#[derive(Debug, Clone)]
pub struct ExtractorOptions {
    pub include_link_tags: bool,
    pub include_resources: bool,
    pub scan_text_urls: bool,
    pub min_content_chars: usize,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self::from(&ExtractionConfig::default())
    }
}

impl From<&ExtractionConfig> for ExtractorOptions {
    fn from(config: &ExtractionConfig) -> Self {
        Self {
            include_link_tags: config.include_link_tags,
            include_resources: config.include_resources,
            scan_text_urls: config.scan_text_urls,
            min_content_chars: config.min_content_chars,
        }
    }
}

/// Everything extracted from one page
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Base URL for resolving links: the page URL, or `<base href>` if present
    pub base_url: Url,
    pub links: Vec<CandidateLink>,
    pub content: ContentRegion,
    pub metadata: PageMetadata,
    pub warnings: Vec<ParseWarning>,
}

/// Extracts candidate links, content region and metadata from HTML
///
/// # Arguments
///
/// * `html_body` - The HTML content to parse; may be malformed
/// * `page_url` - The final URL the HTML was served from
/// * `options` - Which kinds of references to collect
///
/// # Example
///
/// ```
/// use linkwell::extract::{extract, ExtractorOptions};
/// use url::Url;
///
/// let html = r#"<html><body><a href="/page">Link</a></body></html>"#;
/// let page_url = Url::parse("https://example.com/").unwrap();
/// let extraction = extract(html, &page_url, &ExtractorOptions::default());
/// assert_eq!(extraction.links[0].raw_href, "/page");
/// ```
pub fn extract(html_body: &str, page_url: &Url, options: &ExtractorOptions) -> Extraction {
    let document = Html::parse_document(html_body);
    let mut warnings = Vec::new();

    if let Some(first) = document.errors.first() {
        warnings.push(ParseWarning::new(format!(
            "Recovered from {} malformed markup error(s); first: {}",
            document.errors.len(),
            first
        )));
    }

    let base_url = document_base(&document, page_url, &mut warnings);

    let mut links = collect_candidates(&document, options);
    if options.scan_text_urls {
        links.extend(scan_text_urls(&document));
    }

    let content = main_content(&document, options.min_content_chars);
    let metadata = extract_metadata(&document);

    tracing::debug!(
        url = %page_url,
        candidates = links.len(),
        warnings = warnings.len(),
        "Extracted page"
    );

    Extraction {
        base_url,
        links,
        content,
        metadata,
        warnings,
    }
}

/// Resolves the document base from `<base href>`, defaulting to the page URL
fn document_base(document: &Html, page_url: &Url, warnings: &mut Vec<ParseWarning>) -> Url {
    let Ok(selector) = Selector::parse("base[href]") else {
        return page_url.clone();
    };

    let Some(href) = document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("href"))
    else {
        return page_url.clone();
    };

    match page_url.join(href.trim()) {
        Ok(base) if base.scheme() == "http" || base.scheme() == "https" => base,
        Ok(base) => {
            warnings.push(ParseWarning::new(format!(
                "Ignored <base href> with unsupported scheme: {}",
                base.scheme()
            )));
            page_url.clone()
        }
        Err(e) => {
            warnings.push(ParseWarning::new(format!(
                "Ignored malformed <base href=\"{}\">: {}",
                href, e
            )));
            page_url.clone()
        }
    }
}
