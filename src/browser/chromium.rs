//! Headless Chromium backend using chromiumoxide
//!
//! Each session is a separate Chromium process with a single page. The CDP
//! handler runs on its own task; when it ends the process is considered dead.

use crate::browser::{BrowserBackend, BrowserProcess, ReadyState, RenderedDom};
use crate::config::{BrowserPoolConfig, UserAgentConfig};
use crate::BrowserError;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;

/// Launches one headless Chromium process per session
#[derive(Debug, Clone)]
pub struct ChromiumBackend {
    config: BrowserPoolConfig,
    user_agent: String,
}

impl ChromiumBackend {
    pub fn new(config: &BrowserPoolConfig, user_agent: &UserAgentConfig) -> Self {
        Self {
            config: config.clone(),
            user_agent: user_agent.header_value(),
        }
    }

    fn browser_config(&self) -> Result<BrowserConfig, BrowserError> {
        let mut builder = BrowserConfig::builder()
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .arg(format!("--user-agent={}", self.user_agent))
            .window_size(self.config.window_width, self.config.window_height);

        if let Some(executable) = &self.config.executable {
            builder = builder.chrome_executable(executable);
        }
        for arg in &self.config.extra_args {
            builder = builder.arg(arg.as_str());
        }

        builder.build().map_err(BrowserError::Launch)
    }
}

#[async_trait]
impl BrowserBackend for ChromiumBackend {
    async fn launch(&self) -> Result<Box<dyn BrowserProcess>, BrowserError> {
        let config = self.browser_config()?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "CDP handler event error");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let mut process = ChromiumProcess {
                    browser,
                    page: None,
                    handler_task,
                    current_url: String::new(),
                };
                process.shutdown().await;
                return Err(BrowserError::Launch(format!("failed to open page: {}", e)));
            }
        };

        Ok(Box::new(ChromiumProcess {
            browser,
            page: Some(page),
            handler_task,
            current_url: "about:blank".to_string(),
        }))
    }
}

struct ChromiumProcess {
    browser: Browser,
    page: Option<Page>,
    handler_task: JoinHandle<()>,
    current_url: String,
}

impl ChromiumProcess {
    fn page(&self) -> Result<&Page, BrowserError> {
        self.page
            .as_ref()
            .ok_or_else(|| BrowserError::Crashed("page closed".to_string()))
    }

    /// Maps a CDP failure, treating a lost connection as a crash
    fn failure(&self, url: &str, error: impl std::fmt::Display) -> BrowserError {
        if self.handler_task.is_finished() {
            BrowserError::Crashed(error.to_string())
        } else {
            BrowserError::Navigation {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }

    async fn evaluate_string(&self, script: &str) -> Result<String, BrowserError> {
        let page = self.page()?;
        let result = page
            .evaluate(script)
            .await
            .map_err(|e| self.failure(&self.current_url, e))?;
        result
            .into_value::<String>()
            .map_err(|e| self.failure(&self.current_url, format!("unexpected result: {:?}", e)))
    }

    async fn shutdown(&mut self) {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                tracing::debug!(error = %e, "Failed to close page");
            }
        }
        if let Err(e) = self.browser.close().await {
            tracing::debug!(error = %e, "Failed to close browser");
        }
        if let Err(e) = self.browser.wait().await {
            tracing::debug!(error = %e, "Failed to reap browser process");
        }
        self.handler_task.abort();
    }
}

#[async_trait]
impl BrowserProcess for ChromiumProcess {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.current_url = url.to_string();
        let page = self.page()?;
        match page.goto(url).await {
            Ok(_) => Ok(()),
            Err(e) => Err(self.failure(url, e)),
        }
    }

    async fn ready_state(&mut self) -> Result<ReadyState, BrowserError> {
        let state = self.evaluate_string("document.readyState").await?;
        Ok(ReadyState::parse(&state))
    }

    async fn read_dom(&mut self) -> Result<RenderedDom, BrowserError> {
        let html = self
            .evaluate_string("document.documentElement.outerHTML")
            .await?;

        let final_url = self
            .page()?
            .url()
            .await
            .map_err(|e| self.failure(&self.current_url, e))?
            .map(|u| u.to_string())
            .unwrap_or_default();

        Ok(RenderedDom { html, final_url })
    }

    async fn terminate(self: Box<Self>) {
        let mut process = self;
        process.shutdown().await;
    }

    fn is_alive(&self) -> bool {
        !self.handler_task.is_finished()
    }
}
