use crate::common::{html_page, serve_html};
use linkwell::browser::fake::ScriptedBackend;
use linkwell::config::{load_config, load_config_with_hash};
use linkwell::{ConfigError, ExtractRequest, Pipeline};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use wiremock::MockServer;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write config");
    file
}

#[test]
fn test_load_config_file() {
    let file = write_config(
        r#"
[fetch]
timeout-ms = 8000
max-redirects = 3

[browser]
pool-capacity = 4
navigation-timeout-ms = 15000

[user-agent]
crawler-name = "LinkBot"
crawler-version = "2.0"

[extraction]
excluded-extensions = [".pdf", ".zip"]
"#,
    );

    let (config, hash) = load_config_with_hash(file.path()).expect("Failed to load config");

    assert_eq!(config.fetch.timeout_ms, 8000);
    assert_eq!(config.fetch.max_redirects, 3);
    assert_eq!(config.browser.pool_capacity, 4);
    assert_eq!(config.browser.navigation_timeout_ms, 15000);
    assert_eq!(config.user_agent.crawler_name, "LinkBot");
    assert_eq!(config.extraction.excluded_extensions.len(), 2);
    // Untouched sections keep their defaults
    assert_eq!(config.escalation.min_body_bytes, 512);
    assert_eq!(hash.len(), 64);
}

#[test]
fn test_empty_file_is_all_defaults() {
    let file = write_config("");
    let config = load_config(file.path()).expect("Failed to load config");
    assert_eq!(config.browser.pool_capacity, 2);
    assert!(config.markdown.include_tables);
}

#[test]
fn test_invalid_config_rejected() {
    let file = write_config("[browser]\npool-capacity = 0\n");
    assert!(matches!(
        load_config(file.path()),
        Err(ConfigError::Validation(_))
    ));

    let file = write_config("[fetch]\ntimeout-ms = \"soon\"\n");
    assert!(matches!(load_config(file.path()), Err(ConfigError::Parse(_))));
}

#[tokio::test]
async fn test_config_file_drives_pipeline() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    serve_html(
        &server,
        "/",
        200,
        html_page(
            "Downloads",
            r#"<a href="/setup.ZIP">Installer</a><a href="/notes">Release notes</a>"#,
        ),
    )
    .await;

    let file = write_config(
        r#"
[fetch]
retries = 0

[extraction]
excluded-extensions = [".zip"]
"#,
    );
    let config = load_config(file.path()).expect("Failed to load config");
    let p = Pipeline::new(config, Arc::new(ScriptedBackend::new())).expect("Failed to create pipeline");

    let result = p
        .process(ExtractRequest::new(format!("{}/", base_url)))
        .await
        .expect("Extraction failed");

    assert_eq!(result.url_strs(), vec![format!("{}/notes", base_url)]);
}
