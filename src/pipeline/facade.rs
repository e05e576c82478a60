//! Pipeline entry point
//!
//! # Processing Flow
//!
//! 1. Validate the target URL (no network activity on failure)
//! 2. Fetch the page within the overall request timeout
//! 3. Extract candidate links, content region and metadata
//! 4. Normalize and deduplicate links, then apply scope filters,
//!    excluded extensions and `max_links`
//! 5. Convert the content region to Markdown if requested
//!
//! A request either yields a complete [`ExtractionResult`] or a
//! [`PipelineError`]; nothing in between.

use crate::browser::{BrowserBackend, SessionPool};
use crate::config::Config;
use crate::extract::{extract, ExtractorOptions, PageMetadata, ParseWarning};
use crate::fetch::{DirectFetcher, FetchOrchestrator, FetchRequest, RawPage};
use crate::health::{HealthMonitor, HealthReport};
use crate::markdown::{convert_with, MarkdownOptions};
use crate::pipeline::{ExtractOptions, ExtractRequest, ExtractionResult};
use crate::url::{extract_domain, is_internal, normalize, validate_target, LinkSet};
use crate::{ErrorKind, FetchError, PipelineError, PipelineStage, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// The fetch-render-extract pipeline
///
/// Owns the browser session pool. Cheap to share behind an `Arc`; all
/// per-request state is local to [`Pipeline::process`].
pub struct Pipeline {
    config: Config,
    orchestrator: FetchOrchestrator,
    health: HealthMonitor,
}

impl Pipeline {
    /// Creates a pipeline rendering through the given browser backend
    ///
    /// No browser process is started until the first rendered fetch.
    pub fn new(config: Config, backend: Arc<dyn BrowserBackend>) -> Result<Self> {
        let direct = DirectFetcher::new(&config.fetch, &config.user_agent).map_err(|e| {
            PipelineError::new(
                PipelineStage::Fetch,
                ErrorKind::ConnectionFailed,
                format!("failed to build HTTP client: {}", e),
            )
        })?;
        let pool = SessionPool::new(backend, config.browser.clone());
        let orchestrator = FetchOrchestrator::new(direct, pool, config.escalation.clone());
        let health = HealthMonitor::new(config.health.failure_window());

        Ok(Self {
            config,
            orchestrator,
            health,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs one extraction request to completion
    pub async fn process(&self, request: ExtractRequest) -> Result<ExtractionResult> {
        let started = Instant::now();
        let outcome = self.run(&request, started).await;
        self.health.record_request();

        match &outcome {
            Ok(result) => tracing::info!(
                url = %result.source_url,
                strategy = %result.fetch_strategy_used,
                urls = result.urls.len(),
                warnings = result.warnings.len(),
                elapsed_ms = result.elapsed_ms,
                "Extraction complete"
            ),
            Err(e) => {
                self.health.record_failure(e.kind);
                tracing::warn!(
                    url = %request.target_url,
                    stage = %e.stage,
                    kind = %e.kind,
                    error = %e.message,
                    "Extraction failed"
                );
            }
        }

        outcome
    }

    async fn run(&self, request: &ExtractRequest, started: Instant) -> Result<ExtractionResult> {
        let options = &request.options;
        let target = validate_target(&request.target_url)?;

        let timeout = options
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| self.config.fetch.timeout());
        let fetch_request =
            FetchRequest::new(target, options.render, timeout, options.include_markdown);

        let fetch_started = Instant::now();
        let page = match tokio::time::timeout(
            fetch_request.timeout(),
            self.orchestrator.fetch(&fetch_request),
        )
        .await
        {
            Ok(Ok(page)) => page,
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                return Err(FetchError::Timeout {
                    url: fetch_request.target().to_string(),
                }
                .into())
            }
        };
        self.health.record_latency(fetch_started.elapsed());

        tracing::debug!(
            url = %page.final_url,
            status = page.status_code,
            strategy = %page.fetched_via,
            bytes = page.html_body.len(),
            "Fetched page"
        );

        Ok(self.assemble(&fetch_request, options, page, started))
    }

    /// Turns a fetched page into the final result
    fn assemble(
        &self,
        fetch_request: &FetchRequest,
        options: &ExtractOptions,
        page: RawPage,
        started: Instant,
    ) -> ExtractionResult {
        let final_url =
            Url::parse(&page.final_url).unwrap_or_else(|_| fetch_request.target().clone());
        let mut warnings = Vec::new();

        if page.is_error_status() {
            warnings.push(ParseWarning::new(format!(
                "Page returned HTTP status {}",
                page.status_code
            )));
        }

        let mut urls = LinkSet::new();
        let mut metadata = PageMetadata::default();
        let mut markdown = None;
        let mut text = String::new();

        if page.is_html() {
            let extraction = extract(
                &page.html_body,
                &final_url,
                &self.extractor_options(options),
            );
            warnings.extend(extraction.warnings);

            for mut link in extraction.links {
                match normalize(&link.raw_href, &extraction.base_url) {
                    Ok(url) => {
                        link.resolved_url = Some(url.as_str().to_string());
                        urls.insert(url);
                    }
                    Err(rejection) if rejection.is_malformed() => {
                        warnings.push(ParseWarning::new(format!(
                            "Skipped malformed link {:?}: {}",
                            link.raw_href, rejection
                        )));
                    }
                    Err(rejection) => {
                        tracing::debug!(href = %link.raw_href, reason = %rejection, "Link rejected");
                    }
                }
                tracing::trace!(
                    href = %link.raw_href,
                    resolved = ?link.resolved_url,
                    context = ?link.tag_context,
                    "Candidate link"
                );
            }

            if fetch_request.extract_markdown() {
                let md_options = MarkdownOptions::from(&self.config.markdown)
                    .with_base_url(extraction.base_url.clone());
                markdown = Some(convert_with(&extraction.content.html, &md_options));
            }
            metadata = extraction.metadata;
            text = extraction.content.text;
        } else {
            warnings.push(ParseWarning::new(format!(
                "Content-Type '{}' is not HTML; no links extracted",
                page.content_type
            )));
            if fetch_request.extract_markdown() {
                markdown = Some(String::new());
            }
        }

        self.apply_filters(&mut urls, &final_url, options);
        let total_links_found = urls.len();
        if let Some(max) = options.max_links {
            urls.truncate(max);
        }

        ExtractionResult {
            source_url: page.source_url,
            final_url: page.final_url,
            status_code: page.status_code,
            urls,
            total_links_found,
            markdown,
            text,
            metadata,
            fetch_strategy_used: page.fetched_via,
            warnings,
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    }

    fn extractor_options(&self, options: &ExtractOptions) -> ExtractorOptions {
        let defaults = ExtractorOptions::from(&self.config.extraction);
        ExtractorOptions {
            include_link_tags: options
                .include_link_tags
                .unwrap_or(defaults.include_link_tags),
            include_resources: options
                .include_resources
                .unwrap_or(defaults.include_resources),
            scan_text_urls: options.scan_text_urls.unwrap_or(defaults.scan_text_urls),
            min_content_chars: defaults.min_content_chars,
        }
    }

    /// Applies internal/external scope and excluded extensions
    fn apply_filters(&self, urls: &mut LinkSet, final_url: &Url, options: &ExtractOptions) {
        let site_host = extract_domain(final_url).unwrap_or_default();
        let excluded: Vec<String> = self
            .config
            .extraction
            .excluded_extensions
            .iter()
            .map(|ext| ext.to_ascii_lowercase())
            .collect();

        urls.retain(|url| {
            let internal = is_internal(url.host(), &site_host);
            if internal && !options.include_internal {
                return false;
            }
            if !internal && !options.include_external {
                return false;
            }
            let path = url.as_url().path().to_ascii_lowercase();
            !excluded.iter().any(|ext| path.ends_with(ext.as_str()))
        });
    }

    /// Current pool utilization, latency and recent failures
    pub fn health(&self) -> HealthReport {
        self.health.report(self.orchestrator.pool().status())
    }

    /// Stops the browser pool; in-flight renders finish on their sessions
    pub async fn shutdown(&self) {
        self.orchestrator.pool().shutdown().await;
    }
}
