//! Scripted in-memory browser backend
//!
//! Serves canned DOMs per URL without launching a browser. Used by the
//! test suites to exercise rendering, pool limits, crashes and timeouts.

use crate::browser::{BrowserBackend, BrowserProcess, ReadyState, RenderedDom};
use crate::BrowserError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
struct ScriptedPage {
    html: String,
    final_url: Option<String>,
    ready_after_polls: u32,
    hang: bool,
}

#[derive(Default)]
struct ScriptState {
    pages: Mutex<HashMap<String, ScriptedPage>>,
    visits: Mutex<Vec<String>>,
    navigation_delay: Mutex<Duration>,
    launches: AtomicUsize,
    terminated: AtomicUsize,
    peak_live: AtomicUsize,
    crashes_remaining: AtomicUsize,
    fail_launch: AtomicBool,
}

impl ScriptState {
    fn live(&self) -> usize {
        self.launches
            .load(Ordering::SeqCst)
            .saturating_sub(self.terminated.load(Ordering::SeqCst))
    }
}

/// Backend that serves pre-registered pages
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    state: Arc<ScriptState>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the DOM rendered for `url`
    pub fn with_page(self, url: &str, html: &str) -> Self {
        self.insert(
            url,
            ScriptedPage {
                html: html.to_string(),
                final_url: None,
                ready_after_polls: 1,
                hang: false,
            },
        )
    }

    /// Registers a page that ends up at `final_url` after navigation
    pub fn with_redirect(self, url: &str, final_url: &str, html: &str) -> Self {
        self.insert(
            url,
            ScriptedPage {
                html: html.to_string(),
                final_url: Some(final_url.to_string()),
                ready_after_polls: 1,
                hang: false,
            },
        )
    }

    /// Registers a page whose `readyState` never reaches `complete`
    pub fn with_hanging_page(self, url: &str) -> Self {
        self.insert(
            url,
            ScriptedPage {
                html: String::new(),
                final_url: None,
                ready_after_polls: 0,
                hang: true,
            },
        )
    }

    /// Delays every navigation
    pub fn with_navigation_delay(self, delay: Duration) -> Self {
        *lock(&self.state.navigation_delay) = delay;
        self
    }

    /// Makes the next `n` navigations crash their process
    pub fn crash_next(&self, n: usize) {
        self.state.crashes_remaining.store(n, Ordering::SeqCst);
    }

    pub fn fail_launches(&self, fail: bool) {
        self.state.fail_launch.store(fail, Ordering::SeqCst);
    }

    pub fn launches(&self) -> usize {
        self.state.launches.load(Ordering::SeqCst)
    }

    pub fn terminated(&self) -> usize {
        self.state.terminated.load(Ordering::SeqCst)
    }

    /// Highest number of processes alive at the same time
    pub fn peak_live(&self) -> usize {
        self.state.peak_live.load(Ordering::SeqCst)
    }

    /// URLs navigated to, in order
    pub fn visits(&self) -> Vec<String> {
        lock(&self.state.visits).clone()
    }

    fn insert(self, url: &str, page: ScriptedPage) -> Self {
        lock(&self.state.pages).insert(url.to_string(), page);
        self
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[async_trait]
impl BrowserBackend for ScriptedBackend {
    async fn launch(&self) -> Result<Box<dyn BrowserProcess>, BrowserError> {
        if self.state.fail_launch.load(Ordering::SeqCst) {
            return Err(BrowserError::Launch("scripted launch failure".to_string()));
        }
        self.state.launches.fetch_add(1, Ordering::SeqCst);
        self.state
            .peak_live
            .fetch_max(self.state.live(), Ordering::SeqCst);

        Ok(Box::new(ScriptedProcess {
            state: Arc::clone(&self.state),
            current: None,
            polls: 0,
            alive: true,
        }))
    }
}

struct ScriptedProcess {
    state: Arc<ScriptState>,
    current: Option<(String, ScriptedPage)>,
    polls: u32,
    alive: bool,
}

#[async_trait]
impl BrowserProcess for ScriptedProcess {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        if !self.alive {
            return Err(BrowserError::Crashed("process already exited".to_string()));
        }

        let delay = *lock(&self.state.navigation_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let crashed = self
            .state
            .crashes_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if crashed {
            self.alive = false;
            return Err(BrowserError::Crashed(format!("scripted crash at {}", url)));
        }

        lock(&self.state.visits).push(url.to_string());

        let page = lock(&self.state.pages).get(url).cloned();
        match page {
            Some(page) => {
                self.current = Some((url.to_string(), page));
                self.polls = 0;
                Ok(())
            }
            None => Err(BrowserError::Navigation {
                url: url.to_string(),
                message: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            }),
        }
    }

    async fn ready_state(&mut self) -> Result<ReadyState, BrowserError> {
        let Some((_, page)) = &self.current else {
            return Ok(ReadyState::Loading);
        };
        if page.hang {
            return Ok(ReadyState::Loading);
        }
        self.polls += 1;
        if self.polls > page.ready_after_polls {
            Ok(ReadyState::Complete)
        } else {
            Ok(ReadyState::Interactive)
        }
    }

    async fn read_dom(&mut self) -> Result<RenderedDom, BrowserError> {
        match &self.current {
            Some((url, page)) => Ok(RenderedDom {
                html: page.html.clone(),
                final_url: page.final_url.clone().unwrap_or_else(|| url.clone()),
            }),
            None => Ok(RenderedDom {
                html: "<html><head></head><body></body></html>".to_string(),
                final_url: "about:blank".to_string(),
            }),
        }
    }

    async fn terminate(self: Box<Self>) {
        self.state.terminated.fetch_add(1, Ordering::SeqCst);
    }

    fn is_alive(&self) -> bool {
        self.alive
    }
}
