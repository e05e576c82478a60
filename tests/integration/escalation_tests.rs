use crate::common::{html_page, pipeline, serve_html, test_config, APP_SHELL};
use linkwell::browser::fake::ScriptedBackend;
use linkwell::{ErrorKind, PipelineStage};
use linkwell::{ExtractOptions, ExtractRequest, FetchStrategy, RenderMode};
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, ResponseTemplate};

const RENDERED_APP: &str = r#"<html><head><title>App</title></head><body><div id="app">
    <nav><a href="/dashboard">Dashboard</a><a href="/settings">Settings</a></nav>
    <p>Rendered on the client.</p>
</div></body></html>"#;

fn with_render(target: String, render: RenderMode) -> ExtractRequest {
    ExtractRequest::new(target).with_options(ExtractOptions {
        render,
        ..ExtractOptions::default()
    })
}

#[tokio::test]
async fn test_empty_shell_escalates_to_rendered() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let target = format!("{}/", base_url);

    serve_html(&server, "/", 200, APP_SHELL.to_string()).await;
    let backend = ScriptedBackend::new().with_page(&target, RENDERED_APP);

    let p = pipeline(test_config(), &backend);
    let result = p
        .process(ExtractRequest::new(target.clone()))
        .await
        .expect("Extraction failed");

    assert_eq!(result.fetch_strategy_used, FetchStrategy::Rendered);
    assert_eq!(
        result.url_strs(),
        vec![
            format!("{}/dashboard", base_url),
            format!("{}/settings", base_url)
        ]
    );
    assert_eq!(result.final_url, target);
    assert_eq!(backend.visits(), vec![target]);
}

#[tokio::test]
async fn test_large_shell_without_links_escalates() {
    let server = MockServer::start().await;
    let target = format!("{}/", server.uri());

    let shell = format!(
        r#"<html><head><script>{}</script></head><body><div id="root"></div></body></html>"#,
        "window.__STATE__ = {};\n".repeat(50)
    );
    serve_html(&server, "/", 200, shell).await;
    let backend = ScriptedBackend::new().with_page(&target, RENDERED_APP);

    let p = pipeline(test_config(), &backend);
    let result = p
        .process(ExtractRequest::new(target))
        .await
        .expect("Extraction failed");

    assert_eq!(result.fetch_strategy_used, FetchStrategy::Rendered);
    assert_eq!(result.urls.len(), 2);
}

#[tokio::test]
async fn test_content_page_stays_direct() {
    let server = MockServer::start().await;
    let target = format!("{}/", server.uri());

    serve_html(
        &server,
        "/",
        200,
        html_page("Article", r#"<p>An <a href="/next">article</a>.</p>"#),
    )
    .await;
    let backend = ScriptedBackend::new().with_page(&target, RENDERED_APP);

    let p = pipeline(test_config(), &backend);
    let result = p
        .process(ExtractRequest::new(target))
        .await
        .expect("Extraction failed");

    assert_eq!(result.fetch_strategy_used, FetchStrategy::Direct);
    assert_eq!(backend.launches(), 0);
}

#[tokio::test]
async fn test_force_render_skips_direct_fetch() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let target = format!("{}/", server.uri());
    let backend = ScriptedBackend::new().with_page(&target, RENDERED_APP);

    let p = pipeline(test_config(), &backend);
    let result = p
        .process(with_render(target, RenderMode::Force))
        .await
        .expect("Extraction failed");

    assert_eq!(result.fetch_strategy_used, FetchStrategy::Rendered);
    assert_eq!(result.status_code, 200);
    assert_eq!(backend.launches(), 1);
}

#[tokio::test]
async fn test_render_never_keeps_shell() {
    let server = MockServer::start().await;
    let target = format!("{}/", server.uri());

    serve_html(&server, "/", 200, APP_SHELL.to_string()).await;
    let backend = ScriptedBackend::new().with_page(&target, RENDERED_APP);

    let p = pipeline(test_config(), &backend);
    let result = p
        .process(with_render(target, RenderMode::Never))
        .await
        .expect("Extraction failed");

    assert_eq!(result.fetch_strategy_used, FetchStrategy::Direct);
    assert!(result.urls.is_empty());
    assert_eq!(backend.launches(), 0);
}

#[tokio::test]
async fn test_rendered_redirect_reports_final_url() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let target = format!("{}/", base_url);
    let landing = format!("{}/home", base_url);

    let backend = ScriptedBackend::new().with_redirect(&target, &landing, RENDERED_APP);
    let p = pipeline(test_config(), &backend);
    let result = p
        .process(with_render(target, RenderMode::Force))
        .await
        .expect("Extraction failed");

    assert_eq!(result.final_url, landing);
}

#[tokio::test]
async fn test_unreachable_host_escalates() {
    // Nothing listens on the discard port
    let target = "http://127.0.0.1:9/".to_string();
    let backend = ScriptedBackend::new().with_page(&target, RENDERED_APP);

    let p = pipeline(test_config(), &backend);
    let result = p
        .process(ExtractRequest::new(target))
        .await
        .expect("Rendered fallback failed");

    assert_eq!(result.fetch_strategy_used, FetchStrategy::Rendered);
}

#[tokio::test]
async fn test_render_failure_is_terminal() {
    let server = MockServer::start().await;
    let target = format!("{}/", server.uri());

    serve_html(&server, "/", 200, APP_SHELL.to_string()).await;
    // No scripted page: navigation fails
    let backend = ScriptedBackend::new();

    let p = pipeline(test_config(), &backend);
    let err = p.process(ExtractRequest::new(target)).await.unwrap_err();

    assert_eq!(err.stage, PipelineStage::Render);
    assert_eq!(err.kind, ErrorKind::RenderFailed);
    assert_eq!(p.health().failures_by_kind.get(&ErrorKind::RenderFailed), Some(&1));
}

#[tokio::test]
async fn test_navigation_timeout() {
    let target = "https://slow.example.com/".to_string();
    let backend = ScriptedBackend::new().with_hanging_page(&target);

    let mut config = test_config();
    config.browser.navigation_timeout_ms = 200;
    let p = pipeline(config, &backend);

    let err = p
        .process(with_render(target, RenderMode::Force))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::NavigationTimeout);
    assert_eq!(err.stage, PipelineStage::Render);
    assert!(err.kind.is_transient());
}

#[tokio::test]
async fn test_overall_timeout() {
    let target = "https://slow.example.com/".to_string();
    let backend = ScriptedBackend::new()
        .with_page(&target, RENDERED_APP)
        .with_navigation_delay(std::time::Duration::from_millis(500));

    let p = pipeline(test_config(), &backend);
    let request = ExtractRequest::new(target).with_options(ExtractOptions {
        render: RenderMode::Force,
        timeout_ms: Some(100),
        ..ExtractOptions::default()
    });
    let err = p.process(request).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Timeout);
}
