use crate::common::{pipeline, test_config};
use linkwell::browser::fake::ScriptedBackend;
use linkwell::{ErrorKind, PipelineStage};
use linkwell::{ExtractOptions, ExtractRequest, FetchStrategy, RenderMode};
use std::time::Duration;

const PAGE: &str = r#"<html><body><a href="/one">One</a></body></html>"#;

fn rendered(target: &str) -> ExtractRequest {
    ExtractRequest::new(target).with_options(ExtractOptions {
        render: RenderMode::Force,
        ..ExtractOptions::default()
    })
}

#[tokio::test]
async fn test_sessions_are_reused() {
    let target = "https://spa.example.com/";
    let backend = ScriptedBackend::new().with_page(target, PAGE);
    let p = pipeline(test_config(), &backend);

    for _ in 0..3 {
        let result = p.process(rendered(target)).await.expect("Render failed");
        assert_eq!(result.url_strs(), vec!["https://spa.example.com/one"]);
    }

    assert_eq!(backend.launches(), 1);
    assert_eq!(backend.visits().len(), 3);

    let health = p.health();
    assert_eq!(health.pool.busy, 0);
    assert_eq!(health.pool.idle, 1);
}

#[tokio::test]
async fn test_crash_retried_on_fresh_session() {
    let target = "https://spa.example.com/";
    let backend = ScriptedBackend::new().with_page(target, PAGE);
    backend.crash_next(1);
    let p = pipeline(test_config(), &backend);

    let result = p.process(rendered(target)).await.expect("Retry failed");

    assert_eq!(result.fetch_strategy_used, FetchStrategy::Rendered);
    assert_eq!(backend.launches(), 2);
    assert_eq!(backend.visits(), vec![target.to_string()]);
}

#[tokio::test]
async fn test_second_crash_fails_request() {
    let target = "https://spa.example.com/";
    let backend = ScriptedBackend::new().with_page(target, PAGE);
    backend.crash_next(2);
    let p = pipeline(test_config(), &backend);

    let err = p.process(rendered(target)).await.unwrap_err();

    assert_eq!(err.stage, PipelineStage::Render);
    assert_eq!(err.kind, ErrorKind::RenderFailed);
    assert_eq!(backend.launches(), 2);
}

#[tokio::test]
async fn test_pool_exhaustion() {
    let target = "https://spa.example.com/";
    let backend = ScriptedBackend::new()
        .with_page(target, PAGE)
        .with_navigation_delay(Duration::from_millis(500));

    let mut config = test_config();
    config.browser.pool_capacity = 1;
    config.browser.acquire_timeout_ms = 100;
    let p = pipeline(config, &backend);

    let (first, second) = tokio::join!(p.process(rendered(target)), p.process(rendered(target)));

    let outcomes = [first, second];
    let succeeded = outcomes.iter().filter(|o| o.is_ok()).count();
    let exhausted = outcomes
        .iter()
        .filter(|o| matches!(o, Err(e) if e.kind == ErrorKind::PoolExhausted))
        .count();

    assert_eq!(succeeded, 1);
    assert_eq!(exhausted, 1);
    assert_eq!(backend.peak_live(), 1);
    assert!(ErrorKind::PoolExhausted.is_transient());
    assert_eq!(
        p.health().failures_by_kind.get(&ErrorKind::PoolExhausted),
        Some(&1)
    );
}

#[tokio::test]
async fn test_capacity_bounds_live_sessions() {
    let backend = ScriptedBackend::new().with_navigation_delay(Duration::from_millis(50));
    let targets: Vec<String> = (0..6)
        .map(|i| format!("https://spa{}.example.com/", i))
        .collect();
    let backend = targets
        .iter()
        .fold(backend, |backend, target| backend.with_page(target, PAGE));

    let mut config = test_config();
    config.browser.pool_capacity = 2;
    config.browser.acquire_timeout_ms = 5_000;
    let p = pipeline(config, &backend);

    let requests = targets.iter().map(|target| p.process(rendered(target)));
    let outcomes = futures::future::join_all(requests).await;

    assert!(outcomes.iter().all(|o| o.is_ok()));
    assert!(backend.peak_live() <= 2);
    assert!(backend.launches() <= 2);
}

#[tokio::test]
async fn test_shutdown_rejects_new_renders() {
    let target = "https://spa.example.com/";
    let backend = ScriptedBackend::new().with_page(target, PAGE);
    let p = pipeline(test_config(), &backend);

    p.process(rendered(target)).await.expect("Render failed");
    p.shutdown().await;

    let err = p.process(rendered(target)).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::RenderFailed);
    assert_eq!(p.health().pool.idle, 0);
}

#[tokio::test]
async fn test_launch_failure() {
    let target = "https://spa.example.com/";
    let backend = ScriptedBackend::new().with_page(target, PAGE);
    backend.fail_launches(true);
    let p = pipeline(test_config(), &backend);

    let err = p.process(rendered(target)).await.unwrap_err();
    assert_eq!(err.stage, PipelineStage::Render);
    assert_eq!(err.kind, ErrorKind::RenderFailed);

    backend.fail_launches(false);
    p.process(rendered(target)).await.expect("Recovered launch failed");
}
