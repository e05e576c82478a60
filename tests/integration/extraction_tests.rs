use crate::common::{html_page, pipeline, serve_html, serve_redirect, test_config};
use linkwell::browser::fake::ScriptedBackend;
use linkwell::{ExtractOptions, ExtractRequest, FetchStrategy, RenderMode};
use linkwell::{ErrorKind, PipelineStage};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_links_resolved_against_page() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    serve_html(
        &server,
        "/",
        200,
        html_page(
            "Home",
            r##"<a href="/about">About</a>
            <a href="https://other.com/x">Elsewhere</a>
            <a href="#top">Back to top</a>
            <a href="mailto:team@example.com">Mail</a>"##,
        ),
    )
    .await;

    let backend = ScriptedBackend::new();
    let p = pipeline(test_config(), &backend);
    let result = p
        .process(ExtractRequest::new(format!("{}/", base_url)))
        .await
        .expect("Extraction failed");

    assert_eq!(
        result.url_strs(),
        vec![format!("{}/about", base_url).as_str(), "https://other.com/x"]
    );
    assert_eq!(result.fetch_strategy_used, FetchStrategy::Direct);
    assert_eq!(result.status_code, 200);
    assert_eq!(result.metadata.title.as_deref(), Some("Home"));
    assert_eq!(backend.launches(), 0, "direct result must not start a browser");
}

#[tokio::test]
async fn test_duplicates_kept_once_in_first_occurrence_order() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    serve_html(
        &server,
        "/list",
        200,
        html_page(
            "List",
            r#"<a href="/a">A</a><a href="/b">B</a><a href="/a">A again</a><a href="/c">C</a>"#,
        ),
    )
    .await;

    let p = pipeline(test_config(), &ScriptedBackend::new());
    let result = p
        .process(ExtractRequest::new(format!("{}/list", base_url)))
        .await
        .expect("Extraction failed");

    let expected: Vec<String> = ["a", "b", "c"]
        .iter()
        .map(|name| format!("{}/{}", base_url, name))
        .collect();
    assert_eq!(result.url_strs(), expected);
    assert_eq!(result.total_links_found, 3);
}

#[tokio::test]
async fn test_redirect_sets_final_url() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    serve_redirect(&server, "/old", "/docs/new").await;
    serve_html(
        &server,
        "/docs/new",
        200,
        html_page("New", r#"<a href="sibling">Sibling</a>"#),
    )
    .await;

    let p = pipeline(test_config(), &ScriptedBackend::new());
    let result = p
        .process(ExtractRequest::new(format!("{}/old", base_url)))
        .await
        .expect("Extraction failed");

    assert_eq!(result.source_url, format!("{}/old", base_url));
    assert_eq!(result.final_url, format!("{}/docs/new", base_url));
    assert_eq!(result.url_strs(), vec![format!("{}/docs/sibling", base_url)]);
}

#[tokio::test]
async fn test_too_many_redirects() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    serve_redirect(&server, "/r1", "/r2").await;
    serve_redirect(&server, "/r2", "/r3").await;
    serve_redirect(&server, "/r3", "/r4").await;
    serve_html(&server, "/r4", 200, html_page("End", "")).await;

    let mut config = test_config();
    config.fetch.max_redirects = 2;
    let p = pipeline(config, &ScriptedBackend::new());

    let err = p
        .process(ExtractRequest::new(format!("{}/r1", base_url)))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TooManyRedirects);
    assert_eq!(err.stage, PipelineStage::Fetch);
}

#[tokio::test]
async fn test_redirect_loop_detected() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    serve_redirect(&server, "/ping", "/pong").await;
    serve_redirect(&server, "/pong", "/ping").await;

    let p = pipeline(test_config(), &ScriptedBackend::new());
    let err = p
        .process(ExtractRequest::new(format!("{}/ping", base_url)))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TooManyRedirects);
}

#[tokio::test]
async fn test_error_status_is_not_a_failure() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    serve_html(
        &server,
        "/missing",
        404,
        r#"<html><body><h1>Not found</h1><a href="/">Home</a></body></html>"#.to_string(),
    )
    .await;

    let backend = ScriptedBackend::new();
    let p = pipeline(test_config(), &backend);
    let result = p
        .process(ExtractRequest::new(format!("{}/missing", base_url)))
        .await
        .expect("404 page should still be extracted");

    assert_eq!(result.status_code, 404);
    assert_eq!(result.url_strs(), vec![format!("{}/", base_url)]);
    assert_eq!(result.fetch_strategy_used, FetchStrategy::Direct);
    assert!(result.warnings.iter().any(|w| w.message.contains("404")));
    assert_eq!(backend.launches(), 0);
}

#[tokio::test]
async fn test_non_html_response() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"next": "https://example.com/page/2"}"#, "application/json"),
        )
        .mount(&server)
        .await;

    let p = pipeline(test_config(), &ScriptedBackend::new());
    let result = p
        .process(ExtractRequest::new(format!("{}/data.json", base_url)))
        .await
        .expect("Extraction failed");

    assert!(result.urls.is_empty());
    assert_eq!(result.fetch_strategy_used, FetchStrategy::Direct);
    assert!(result.warnings[0].message.contains("application/json"));
}

#[tokio::test]
async fn test_options_filter_and_markdown() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    serve_html(
        &server,
        "/guide",
        200,
        html_page(
            "Guide",
            r#"<h1>Guide</h1>
            <p>Read the <a href="/intro">introduction</a> first.</p>
            <a href="https://cdn.example.org/lib">Library</a>
            <a href="/manual.pdf">Manual</a>"#,
        ),
    )
    .await;

    let mut config = test_config();
    config.extraction.excluded_extensions = vec![".pdf".to_string()];
    let p = pipeline(config, &ScriptedBackend::new());

    let request = ExtractRequest::new(format!("{}/guide", base_url)).with_options(ExtractOptions {
        render: RenderMode::Never,
        include_external: false,
        include_markdown: true,
        ..ExtractOptions::default()
    });
    let result = p.process(request).await.expect("Extraction failed");

    assert_eq!(result.url_strs(), vec![format!("{}/intro", base_url)]);

    let markdown = result.markdown.expect("markdown requested");
    assert!(markdown.starts_with("# Guide"));
    assert!(markdown.contains(&format!("[introduction]({}/intro)", base_url)));
}

#[tokio::test]
async fn test_max_links_reports_total() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    let anchors: String = (1..=5)
        .map(|i| format!(r#"<a href="/p{}">Page {}</a>"#, i, i))
        .collect();
    serve_html(&server, "/", 200, html_page("Pages", &anchors)).await;

    let p = pipeline(test_config(), &ScriptedBackend::new());
    let request = ExtractRequest::new(format!("{}/", base_url)).with_options(ExtractOptions {
        max_links: Some(2),
        ..ExtractOptions::default()
    });
    let result = p.process(request).await.expect("Extraction failed");

    assert_eq!(result.urls.len(), 2);
    assert_eq!(result.total_links_found, 5);
    assert_eq!(result.url_strs()[0], format!("{}/p1", base_url));
}

#[tokio::test]
async fn test_invalid_target_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let backend = ScriptedBackend::new();
    let p = pipeline(test_config(), &backend);

    for target in ["not-a-url", "ftp://example.com/file", ""] {
        let err = p.process(ExtractRequest::new(target)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidUrl, "target {:?}", target);
        assert_eq!(err.stage, PipelineStage::Validate);
    }
    assert_eq!(backend.launches(), 0);
}
