use crate::fetch::RenderMode;
use serde::Deserialize;

/// Per-request options of an extraction
///
/// Unset optional flags fall back to the pipeline configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    pub render: RenderMode,

    /// Overall budget for the request; defaults to `fetch.timeout-ms`
    pub timeout_ms: Option<u64>,

    pub include_markdown: bool,

    /// Keep URLs on the page's own host and its subdomains
    pub include_internal: bool,

    /// Keep URLs on other hosts
    pub include_external: bool,

    /// Keep only the first N URLs
    pub max_links: Option<usize>,

    pub include_resources: Option<bool>,

    pub include_link_tags: Option<bool>,

    pub scan_text_urls: Option<bool>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            render: RenderMode::Auto,
            timeout_ms: None,
            include_markdown: false,
            include_internal: true,
            include_external: true,
            max_links: None,
            include_resources: None,
            include_link_tags: None,
            scan_text_urls: None,
        }
    }
}

/// A raw extraction request, as received from the API layer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExtractRequest {
    pub target_url: String,

    #[serde(default)]
    pub options: ExtractOptions,
}

impl ExtractRequest {
    pub fn new(target_url: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
            options: ExtractOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }
}
