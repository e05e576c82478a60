//! Bounded pool of browser sessions
//!
//! The pool hands out at most `pool-capacity` sessions at a time. A counting
//! semaphore gates checkout; each permit travels with the [`SessionGuard`]
//! so that every exit path, including cancellation of the caller's future,
//! releases the slot.
//!
//! A background reaper wakes every [`BrowserPoolConfig::reap_interval`] and
//! retires idle sessions past their idle timeout, age or request limit, so
//! an unused pool does not keep browser processes alive.

use crate::browser::session::{BrowserSession, RetireReason};
use crate::browser::{BrowserBackend, ReadyState, RenderedDom};
use crate::config::BrowserPoolConfig;
use crate::BrowserError;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Snapshot of pool utilization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    pub capacity: usize,
    pub busy: usize,
    pub idle: usize,
}

struct PoolInner {
    backend: Arc<dyn BrowserBackend>,
    config: BrowserPoolConfig,
    permits: Arc<Semaphore>,
    idle: Mutex<Vec<BrowserSession>>,
    busy: AtomicUsize,
    next_id: AtomicU64,
    closed: AtomicBool,
    reaper: Mutex<Option<JoinHandle<()>>>,
}

impl PoolInner {
    fn idle_sessions(&self) -> MutexGuard<'_, Vec<BrowserSession>> {
        self.idle.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn stop_reaper(&self) {
        let reaper = self.reaper.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(reaper) = reaper {
            reaper.abort();
        }
    }

    /// Terminates a session in the background
    fn retire(&self, session: BrowserSession, reason: RetireReason) {
        tracing::info!(session = session.id, reason = %reason, "Retiring browser session");
        let process = session.process;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    process.terminate().await;
                });
            }
            Err(_) => {
                tracing::warn!("No runtime available to terminate browser session");
            }
        }
    }

    /// Removes idle sessions that should not be reused
    fn retire_expired(&self) {
        let now = Instant::now();
        let mut expired = Vec::new();
        {
            let mut idle = self.idle_sessions();
            let mut i = 0;
            while i < idle.len() {
                if let Some(reason) = idle[i].retirement_reason(&self.config, now) {
                    expired.push((idle.swap_remove(i), reason));
                } else {
                    i += 1;
                }
            }
        }
        for (session, reason) in expired {
            self.retire(session, reason);
        }
    }
}

impl Drop for PoolInner {
    fn drop(&mut self) {
        self.stop_reaper();
    }
}

/// Periodically retires expired idle sessions until the pool closes or drops
fn spawn_reaper(pool: Weak<PoolInner>, period: Duration) -> Option<JoinHandle<()>> {
    let Ok(handle) = tokio::runtime::Handle::try_current() else {
        tracing::debug!("No runtime available, idle sessions are only reaped on acquire");
        return None;
    };

    Some(handle.spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let Some(pool) = pool.upgrade() else {
                break;
            };
            if pool.closed.load(Ordering::Acquire) {
                break;
            }
            pool.retire_expired();
        }
    }))
}

/// Shared, cloneable handle to the session pool
#[derive(Clone)]
pub struct SessionPool {
    inner: Arc<PoolInner>,
}

impl SessionPool {
    pub fn new(backend: Arc<dyn BrowserBackend>, config: BrowserPoolConfig) -> Self {
        let capacity = config.pool_capacity;
        let period = config.reap_interval();
        let inner = Arc::new(PoolInner {
            backend,
            config,
            permits: Arc::new(Semaphore::new(capacity)),
            idle: Mutex::new(Vec::new()),
            busy: AtomicUsize::new(0),
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
            reaper: Mutex::new(None),
        });

        let reaper = spawn_reaper(Arc::downgrade(&inner), period);
        *inner.reaper.lock().unwrap_or_else(|e| e.into_inner()) = reaper;

        Self { inner }
    }

    pub fn config(&self) -> &BrowserPoolConfig {
        &self.inner.config
    }

    /// Checks out a session, waiting up to `timeout` for a free slot
    ///
    /// Idle sessions are reused when still healthy; otherwise a new browser
    /// process is launched. Returns [`BrowserError::PoolExhausted`] if no
    /// slot frees up in time.
    pub async fn acquire(&self, timeout: Duration) -> Result<SessionGuard, BrowserError> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(BrowserError::PoolClosed);
        }

        let started = Instant::now();
        let permit = match tokio::time::timeout(
            timeout,
            Arc::clone(&self.inner.permits).acquire_owned(),
        )
        .await
        {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => return Err(BrowserError::PoolClosed),
            Err(_) => {
                let waited_ms = started.elapsed().as_millis() as u64;
                tracing::warn!(waited_ms, "Browser pool exhausted");
                return Err(BrowserError::PoolExhausted { waited_ms });
            }
        };

        self.inner.retire_expired();

        let reused = self.inner.idle_sessions().pop();
        let mut session = match reused {
            Some(session) => {
                tracing::debug!(session = session.id, "Reusing browser session");
                session
            }
            None => {
                let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
                let process = self.inner.backend.launch().await?;
                tracing::info!(session = id, "Launched browser session");
                BrowserSession::new(id, process)
            }
        };

        session.mark_busy();
        self.inner.busy.fetch_add(1, Ordering::AcqRel);

        Ok(SessionGuard {
            session: Some(session),
            pool: Arc::clone(&self.inner),
            discard: false,
            in_flight: false,
            _permit: permit,
        })
    }

    /// Returns a session to the pool
    ///
    /// Dropping the guard has the same effect.
    pub fn release(&self, guard: SessionGuard) {
        drop(guard);
    }

    /// Drives a session to `url` and reads back the rendered DOM
    ///
    /// Waits for `document.readyState == "complete"`, then the configured
    /// settle delay. Exceeding `timeout` yields
    /// [`BrowserError::NavigationTimeout`] and the session is discarded on
    /// release, as is a session that crashed.
    pub async fn navigate(
        &self,
        guard: &mut SessionGuard,
        url: &str,
        timeout: Duration,
    ) -> Result<RenderedDom, BrowserError> {
        let poll_interval = self.inner.config.ready_poll_interval();
        let settle_delay = self.inner.config.settle_delay();

        let Some(session) = guard.session.as_mut() else {
            return Err(BrowserError::PoolClosed);
        };

        session.record_request();
        guard.in_flight = true;

        let result = tokio::time::timeout(timeout, async {
            session.process.navigate(url).await?;
            loop {
                let state = session.process.ready_state().await?;
                if state == ReadyState::Complete {
                    break;
                }
                tracing::debug!(url, state = %state, "Waiting for page load");
                tokio::time::sleep(poll_interval).await;
            }
            if !settle_delay.is_zero() {
                tokio::time::sleep(settle_delay).await;
            }
            session.process.read_dom().await
        })
        .await;

        guard.in_flight = false;

        match result {
            Ok(Ok(dom)) => Ok(dom),
            Ok(Err(e)) => {
                if e.is_crash() || !session.process.is_alive() {
                    guard.discard = true;
                }
                Err(e)
            }
            Err(_) => {
                guard.discard = true;
                Err(BrowserError::NavigationTimeout {
                    url: url.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }

    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            capacity: self.inner.config.pool_capacity,
            busy: self.inner.busy.load(Ordering::Acquire),
            idle: self.inner.idle_sessions().len(),
        }
    }

    /// Stops handing out sessions and terminates idle ones
    ///
    /// Sessions still checked out are terminated when their guards drop.
    pub async fn shutdown(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.permits.close();
        self.inner.stop_reaper();

        let idle: Vec<BrowserSession> = self.inner.idle_sessions().drain(..).collect();
        tracing::info!(sessions = idle.len(), "Shutting down browser pool");
        for session in idle {
            session.process.terminate().await;
        }
    }
}

/// Exclusive handle to one checked-out session
///
/// Dropping the guard returns the session to the pool, or terminates it if
/// it failed, was interrupted mid-navigation, or the pool has closed.
pub struct SessionGuard {
    session: Option<BrowserSession>,
    pool: Arc<PoolInner>,
    discard: bool,
    in_flight: bool,
    // Released after the session is parked in Drop
    _permit: OwnedSemaphorePermit,
}

impl SessionGuard {
    pub fn session_id(&self) -> Option<u64> {
        self.session.as_ref().map(BrowserSession::id)
    }
}

impl fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionGuard")
            .field("session", &self.session_id())
            .field("discard", &self.discard)
            .field("in_flight", &self.in_flight)
            .finish()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        self.pool.busy.fetch_sub(1, Ordering::AcqRel);

        let reason = if self.pool.closed.load(Ordering::Acquire) {
            Some(RetireReason::Shutdown)
        } else if self.discard || self.in_flight {
            Some(RetireReason::Failed)
        } else if !session.process.is_alive() {
            Some(RetireReason::Dead)
        } else {
            None
        };

        match reason {
            Some(reason) => self.pool.retire(session, reason),
            None => {
                session.mark_idle();
                self.pool.idle_sessions().push(session);
            }
        }
    }
}
