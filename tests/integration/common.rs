use linkwell::browser::fake::ScriptedBackend;
use linkwell::{Config, Pipeline};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Configuration with short timeouts and no retry delays
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.fetch.timeout_ms = 5_000;
    config.fetch.retries = 0;
    config.fetch.retry_backoff_ms = 10;
    config.browser.pool_capacity = 2;
    config.browser.acquire_timeout_ms = 1_000;
    config.browser.navigation_timeout_ms = 2_000;
    config.browser.settle_delay_ms = 0;
    config.browser.ready_poll_interval_ms = 5;
    config
}

pub fn pipeline(config: Config, backend: &ScriptedBackend) -> Pipeline {
    Pipeline::new(config, Arc::new(backend.clone())).expect("Failed to create pipeline")
}

/// Wraps body markup in a page large enough to be kept as a direct result
pub fn html_page(title: &str, body: &str) -> String {
    format!(
        r#"<html><head><title>{}</title></head><body>
        <main>{}</main>
        <p>{}</p>
        </body></html>"#,
        title,
        body,
        "Plenty of server-rendered prose so the page stands on its own. ".repeat(10)
    )
}

/// Markup of a client-side application shell with no server-rendered content
pub const APP_SHELL: &str = r#"<html><head><script src="/bundle.js"></script></head><body><div id="app"></div></body></html>"#;

pub async fn serve_html(server: &MockServer, route: &str, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_raw(body, "text/html"))
        .mount(server)
        .await;
}

pub async fn serve_redirect(server: &MockServer, route: &str, location: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(301).insert_header("location", location))
        .mount(server)
        .await;
}
