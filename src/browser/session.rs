//! Browser session bookkeeping
//!
//! A session wraps one browser process together with the counters the pool
//! uses to decide when to retire it.

use crate::browser::BrowserProcess;
use crate::config::BrowserPoolConfig;
use std::fmt;
use std::time::Instant;

/// Whether a session is checked out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Parked in the pool, available to the next caller
    Idle,

    /// Held by exactly one caller
    Busy,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Busy => "busy",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a session is being torn down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetireReason {
    /// Older than `max-session-age-secs`
    MaxAge,

    /// Served `max-session-requests` navigations
    MaxRequests,

    /// Sat idle longer than `idle-timeout-secs`
    IdleTimeout,

    /// The process exited or disconnected
    Dead,

    /// Crashed or stopped responding while in use
    Failed,

    /// The pool is shutting down
    Shutdown,
}

impl RetireReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MaxAge => "max_age",
            Self::MaxRequests => "max_requests",
            Self::IdleTimeout => "idle_timeout",
            Self::Dead => "dead",
            Self::Failed => "failed",
            Self::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for RetireReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One pooled browser process
pub struct BrowserSession {
    pub(crate) id: u64,
    pub(crate) process: Box<dyn BrowserProcess>,
    state: SessionState,
    created_at: Instant,
    last_used: Instant,
    requests: u32,
}

impl BrowserSession {
    pub(crate) fn new(id: u64, process: Box<dyn BrowserProcess>) -> Self {
        let now = Instant::now();
        Self {
            id,
            process,
            state: SessionState::Idle,
            created_at: now,
            last_used: now,
            requests: 0,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn requests(&self) -> u32 {
        self.requests
    }

    pub(crate) fn mark_busy(&mut self) {
        self.state = SessionState::Busy;
    }

    pub(crate) fn mark_idle(&mut self) {
        self.state = SessionState::Idle;
        self.last_used = Instant::now();
    }

    pub(crate) fn record_request(&mut self) {
        self.requests = self.requests.saturating_add(1);
        self.last_used = Instant::now();
    }

    /// Returns the reason this session should no longer be handed out
    pub(crate) fn retirement_reason(
        &self,
        config: &BrowserPoolConfig,
        now: Instant,
    ) -> Option<RetireReason> {
        if !self.process.is_alive() {
            Some(RetireReason::Dead)
        } else if now.duration_since(self.created_at) >= config.max_session_age() {
            Some(RetireReason::MaxAge)
        } else if self.requests >= config.max_session_requests {
            Some(RetireReason::MaxRequests)
        } else if self.state == SessionState::Idle
            && now.duration_since(self.last_used) >= config.idle_timeout()
        {
            Some(RetireReason::IdleTimeout)
        } else {
            None
        }
    }
}

impl fmt::Debug for BrowserSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserSession")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("requests", &self.requests)
            .field("age", &self.created_at.elapsed())
            .finish()
    }
}
