use crate::common::{html_page, pipeline, test_config};
use linkwell::browser::fake::ScriptedBackend;
use linkwell::config::{FetchConfig, UserAgentConfig};
use linkwell::fetch::DirectFetcher;
use linkwell::{ErrorKind, PipelineStage};
use linkwell::{ExtractOptions, ExtractRequest, RenderMode};
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn direct_only(target: String) -> ExtractRequest {
    ExtractRequest::new(target).with_options(ExtractOptions {
        render: RenderMode::Never,
        timeout_ms: Some(5_000),
        ..ExtractOptions::default()
    })
}

#[tokio::test]
async fn test_timeouts_retried_up_to_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(html_page("Slow", "<p>late</p>"), "text/html")
                .set_delay(Duration::from_millis(500)),
        )
        .expect(3)
        .mount(&server)
        .await;

    let mut config = test_config();
    config.fetch.timeout_ms = 200;
    config.fetch.retries = 2;
    let p = pipeline(config, &ScriptedBackend::new());

    let err = p
        .process(direct_only(format!("{}/slow", server.uri())))
        .await
        .unwrap_err();

    assert_eq!(err.stage, PipelineStage::Fetch);
    assert_eq!(err.kind, ErrorKind::Timeout);
}

#[tokio::test]
async fn test_error_status_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(
            ResponseTemplate::new(503).set_body_raw("<html><body>Busy</body></html>", "text/html"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config();
    config.fetch.retries = 2;
    let p = pipeline(config, &ScriptedBackend::new());

    let result = p
        .process(direct_only(format!("{}/busy", server.uri())))
        .await
        .expect("503 should be passed through");

    assert_eq!(result.status_code, 503);
}

#[tokio::test]
async fn test_retry_recovers_after_timeout() {
    let server = MockServer::start().await;
    // First request stalls, the retry is answered at once
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(html_page("Flaky", ""), "text/html")
                .set_delay(Duration::from_millis(500)),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(html_page("Flaky", r#"<a href="/ok">ok</a>"#), "text/html"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = FetchConfig {
        timeout_ms: 200,
        retries: 1,
        retry_backoff_ms: 1,
        ..FetchConfig::default()
    };
    let fetcher = DirectFetcher::new(&config, &UserAgentConfig::default()).unwrap();
    let url = Url::parse(&format!("{}/flaky", server.uri())).unwrap();

    let page = fetcher.fetch(&url).await.expect("Retry should succeed");
    assert_eq!(page.status_code, 200);
    assert!(page.html_body.contains("/ok"));
}
