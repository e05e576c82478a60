use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Linkwell
///
/// Every section is optional in the TOML file; missing sections and keys
/// fall back to the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub escalation: EscalationConfig,
    pub browser: BrowserPoolConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub extraction: ExtractionConfig,
    pub markdown: MarkdownConfig,
    pub health: HealthConfig,
}

/// Direct HTTP fetch configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetchConfig {
    /// Default overall per-request timeout (milliseconds)
    pub timeout_ms: u64,

    /// TCP connect timeout (milliseconds)
    pub connect_timeout_ms: u64,

    /// Maximum redirect hops followed before giving up
    pub max_redirects: usize,

    /// Additional attempts after a connection-level failure
    pub retries: u32,

    /// Fixed delay between attempts (milliseconds)
    pub retry_backoff_ms: u64,

    /// Global cap on concurrent direct fetches
    pub max_outbound_connections: usize,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            connect_timeout_ms: 10_000,
            max_redirects: 10,
            retries: 2,
            retry_backoff_ms: 500,
            max_outbound_connections: 64,
        }
    }
}

/// Thresholds that decide when a direct fetch is escalated to a rendered one
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EscalationConfig {
    /// Bodies shorter than this many bytes are treated as insufficient
    pub min_body_bytes: usize,

    /// Visible body text shorter than this counts as an empty page
    pub min_text_chars: usize,

    /// Element ids used by client-side frameworks as their mount point
    pub shell_markers: Vec<String>,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            min_body_bytes: 512,
            min_text_chars: 32,
            shell_markers: ["app", "root", "__next", "__nuxt", "svelte"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Browser session pool configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BrowserPoolConfig {
    /// Maximum number of live browser sessions
    pub pool_capacity: usize,

    /// How long an acquisition waits for a free session (milliseconds)
    pub acquire_timeout_ms: u64,

    /// Upper bound on navigation plus load completion (milliseconds)
    pub navigation_timeout_ms: u64,

    /// Extra delay after the document reports ready (milliseconds)
    pub settle_delay_ms: u64,

    /// Interval between document ready-state polls (milliseconds)
    pub ready_poll_interval_ms: u64,

    /// Sessions older than this are retired instead of reused (seconds)
    pub max_session_age_secs: u64,

    /// Sessions that served this many navigations are retired
    pub max_session_requests: u32,

    /// Idle sessions unused for this long are retired (seconds)
    pub idle_timeout_secs: u64,

    /// Path to the Chromium executable; auto-detected when unset
    pub executable: Option<String>,

    /// Additional command line arguments for Chromium
    pub extra_args: Vec<String>,

    pub window_width: u32,

    pub window_height: u32,
}

impl BrowserPoolConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn ready_poll_interval(&self) -> Duration {
        Duration::from_millis(self.ready_poll_interval_ms)
    }

    pub fn max_session_age(&self) -> Duration {
        Duration::from_secs(self.max_session_age_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// How often idle sessions are checked for retirement
    pub fn reap_interval(&self) -> Duration {
        (self.idle_timeout() / 4).clamp(Duration::from_millis(50), Duration::from_secs(30))
    }
}

impl Default for BrowserPoolConfig {
    fn default() -> Self {
        Self {
            pool_capacity: 2,
            acquire_timeout_ms: 10_000,
            navigation_timeout_ms: 30_000,
            settle_delay_ms: 500,
            ready_poll_interval_ms: 100,
            max_session_age_secs: 600,
            max_session_requests: 50,
            idle_timeout_secs: 120,
            executable: None,
            extra_args: Vec::new(),
            window_width: 1920,
            window_height: 1080,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the client
    pub crawler_name: String,

    /// Version of the client
    pub crawler_version: String,

    /// URL with information about the client
    pub contact_url: Option<String>,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `Name/Version (+ContactURL)`, the parenthesised part only
    /// when a contact URL is configured.
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(url) => format!("{}/{} (+{})", self.crawler_name, self.crawler_version, url),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "Linkwell".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

/// Link extraction defaults, overridable per request
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExtractionConfig {
    /// Include canonical/alternate `<link>` targets
    pub include_link_tags: bool,

    /// Include images, scripts, stylesheets, frames and media sources
    pub include_resources: bool,

    /// Also collect URLs written as plain text on the page
    pub scan_text_urls: bool,

    /// Minimum text length for a main-content candidate region
    pub min_content_chars: usize,

    /// Path suffixes whose URLs are dropped from results (e.g. ".pdf")
    pub excluded_extensions: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            include_link_tags: false,
            include_resources: false,
            scan_text_urls: false,
            min_content_chars: 100,
            excluded_extensions: Vec::new(),
        }
    }
}

/// HTML to Markdown conversion configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MarkdownConfig {
    pub include_images: bool,
    pub include_tables: bool,

    /// Drop navigation, header, footer, aside and form controls
    pub strip_chrome: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            include_images: true,
            include_tables: true,
            strip_chrome: true,
        }
    }
}

/// Health reporting configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HealthConfig {
    /// Failures older than this are dropped from the report (seconds)
    pub failure_window_secs: u64,
}

impl HealthConfig {
    pub fn failure_window(&self) -> Duration {
        Duration::from_secs(self.failure_window_secs)
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            failure_window_secs: 300,
        }
    }
}
