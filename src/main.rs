//! Linkwell main entry point
//!
//! Command-line front end for the extraction pipeline: one URL in, one JSON
//! document out.

use anyhow::Context;
use clap::Parser;
use linkwell::browser::ChromiumBackend;
use linkwell::config::{load_config_with_hash, Config};
use linkwell::health::print_health;
use linkwell::{ExtractOptions, ExtractRequest, Pipeline, RenderMode};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Linkwell: extract the links (and optionally Markdown) from a web page
///
/// The page is fetched directly over HTTP and rendered in headless Chromium
/// when it turns out to need JavaScript. The result is printed as JSON.
#[derive(Parser, Debug)]
#[command(name = "linkwell")]
#[command(version)]
#[command(about = "Extract links from a web page", long_about = None)]
struct Cli {
    /// URL of the page to process
    #[arg(value_name = "URL", required_unless_present = "check_config")]
    url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Fetch strategy: auto, force or never
    #[arg(long, default_value_t = RenderMode::Auto)]
    render: RenderMode,

    /// Overall request timeout in milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Include a Markdown rendering of the main content
    #[arg(long)]
    markdown: bool,

    /// Keep only the first N URLs
    #[arg(long, value_name = "N")]
    max_links: Option<usize>,

    /// Drop links to the page's own site
    #[arg(long)]
    no_internal: bool,

    /// Drop links to other sites
    #[arg(long)]
    no_external: bool,

    /// Include images, scripts, stylesheets and other page resources
    #[arg(long)]
    resources: bool,

    /// Also collect URLs written as plain text
    #[arg(long)]
    text_urls: bool,

    /// Print a pipeline health summary to stderr after the request
    #[arg(long)]
    health: bool,

    /// Validate the configuration, print a summary and exit
    #[arg(long)]
    check_config: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if cli.check_config {
        print_config(&config);
        return Ok(());
    }

    let Some(url) = cli.url.clone() else {
        anyhow::bail!("a URL is required");
    };

    let backend = ChromiumBackend::new(&config.browser, &config.user_agent);
    let pipeline = Pipeline::new(config, Arc::new(backend))?;

    let request = ExtractRequest::new(url).with_options(ExtractOptions {
        render: cli.render,
        timeout_ms: cli.timeout_ms,
        include_markdown: cli.markdown,
        include_internal: !cli.no_internal,
        include_external: !cli.no_external,
        max_links: cli.max_links,
        include_resources: cli.resources.then_some(true),
        include_link_tags: None,
        scan_text_urls: cli.text_urls.then_some(true),
    });

    let outcome = pipeline.process(request).await;

    if cli.health {
        print_health(&pipeline.health());
    }
    pipeline.shutdown().await;

    match outcome {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(e) => {
            println!("{}", serde_json::to_string_pretty(&e)?);
            std::process::exit(1);
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("linkwell=info,warn"),
            1 => EnvFilter::new("linkwell=debug,info"),
            2 => EnvFilter::new("linkwell=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Prints the effective configuration
fn print_config(config: &Config) {
    println!("=== Linkwell Configuration ===\n");

    println!("Direct Fetch:");
    println!("  Timeout: {}ms", config.fetch.timeout_ms);
    println!("  Connect timeout: {}ms", config.fetch.connect_timeout_ms);
    println!("  Max redirects: {}", config.fetch.max_redirects);
    println!(
        "  Retries: {} ({}ms backoff)",
        config.fetch.retries, config.fetch.retry_backoff_ms
    );
    println!(
        "  Max outbound connections: {}",
        config.fetch.max_outbound_connections
    );

    println!("\nEscalation:");
    println!("  Min body bytes: {}", config.escalation.min_body_bytes);
    println!("  Min text chars: {}", config.escalation.min_text_chars);
    println!(
        "  Shell markers: {}",
        config.escalation.shell_markers.join(", ")
    );

    println!("\nBrowser Pool:");
    println!("  Capacity: {}", config.browser.pool_capacity);
    println!("  Acquire timeout: {}ms", config.browser.acquire_timeout_ms);
    println!(
        "  Navigation timeout: {}ms",
        config.browser.navigation_timeout_ms
    );
    println!(
        "  Session limits: {}s age, {} requests, {}s idle",
        config.browser.max_session_age_secs,
        config.browser.max_session_requests,
        config.browser.idle_timeout_secs
    );
    println!(
        "  Executable: {}",
        config.browser.executable.as_deref().unwrap_or("(auto-detect)")
    );

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nExtraction:");
    println!("  Link tags: {}", config.extraction.include_link_tags);
    println!("  Resources: {}", config.extraction.include_resources);
    println!("  Text URLs: {}", config.extraction.scan_text_urls);
    if !config.extraction.excluded_extensions.is_empty() {
        println!(
            "  Excluded extensions: {}",
            config.extraction.excluded_extensions.join(", ")
        );
    }

    println!("\n✓ Configuration is valid");
}
