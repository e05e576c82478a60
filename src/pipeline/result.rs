use crate::extract::{PageMetadata, ParseWarning};
use crate::fetch::FetchStrategy;
use crate::url::LinkSet;
use serde::Serialize;

/// Terminal artifact of a successful extraction
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    pub source_url: String,

    /// URL after redirects or in-browser navigation
    pub final_url: String,

    /// HTTP status of the fetched page
    pub status_code: u16,

    /// Normalized, deduplicated URLs in first-occurrence order
    pub urls: LinkSet,

    /// Number of URLs before `max_links` truncation
    pub total_links_found: usize,

    pub markdown: Option<String>,

    /// Visible text of the main content region
    pub text: String,

    pub metadata: PageMetadata,

    pub fetch_strategy_used: FetchStrategy,

    pub warnings: Vec<ParseWarning>,

    pub elapsed_ms: u64,
}

impl ExtractionResult {
    pub fn url_strs(&self) -> Vec<&str> {
        self.urls.as_strs()
    }
}
