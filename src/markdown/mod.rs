//! HTML to Markdown conversion
//!
//! This module converts the content fragment chosen by the extractor into
//! Markdown text with `htmd`. Link and image targets are resolved against
//! the page URL before conversion and Markdown-significant characters in
//! text are escaped by the converter.

mod converter;

use crate::config::MarkdownConfig;
use url::Url;

/// Controls what the converter emits
#[derive(Debug, Clone)]
pub struct MarkdownOptions {
    /// Render `<img>` as `![alt](src)`
    pub include_images: bool,

    /// Render `<table>` as a pipe table instead of plain text
    pub include_tables: bool,

    /// Drop navigation, header, footer, aside and form controls
    pub strip_chrome: bool,

    /// Base for resolving relative link and image targets
    pub base_url: Option<Url>,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self::from(&MarkdownConfig::default())
    }
}

impl From<&MarkdownConfig> for MarkdownOptions {
    fn from(config: &MarkdownConfig) -> Self {
        Self {
            include_images: config.include_images,
            include_tables: config.include_tables,
            strip_chrome: config.strip_chrome,
            base_url: None,
        }
    }
}

impl MarkdownOptions {
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }
}

/// Converts an HTML fragment to Markdown with default options
///
/// # Example
///
/// ```
/// use linkwell::markdown::convert;
///
/// let md = convert("<h2>Intro</h2><p>Hello <strong>world</strong></p>");
/// assert_eq!(md, "## Intro\n\nHello **world**");
/// ```
pub fn convert(html_fragment: &str) -> String {
    convert_with(html_fragment, &MarkdownOptions::default())
}

/// Converts an HTML fragment to Markdown
pub fn convert_with(html_fragment: &str, options: &MarkdownOptions) -> String {
    let prepared = converter::prepare(html_fragment, options);
    match converter::build(options).convert(&prepared) {
        Ok(markdown) => converter::tidy(&markdown),
        Err(e) => {
            tracing::warn!(error = %e, "Markdown conversion failed, using plain text");
            converter::fallback_text(html_fragment)
        }
    }
}
