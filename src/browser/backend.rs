use crate::BrowserError;
use async_trait::async_trait;
use std::fmt;

/// Value of `document.readyState` in a rendered page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

impl ReadyState {
    /// Parses the string the DOM reports; unknown values count as loading
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "complete" => Self::Complete,
            "interactive" => Self::Interactive,
            _ => Self::Loading,
        }
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Loading => "loading",
            Self::Interactive => "interactive",
            Self::Complete => "complete",
        };
        f.write_str(s)
    }
}

/// Serialized DOM read back from a rendered page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDom {
    pub html: String,

    /// URL of the document after any redirects or client-side navigation
    pub final_url: String,
}

/// Launches headless browser processes
#[async_trait]
pub trait BrowserBackend: Send + Sync {
    /// Starts a new browser process ready to navigate
    async fn launch(&self) -> Result<Box<dyn BrowserProcess>, BrowserError>;
}

/// A single running browser process
///
/// Implementations report a dead or disconnected process through
/// [`BrowserError::Crashed`] and [`BrowserProcess::is_alive`].
#[async_trait]
pub trait BrowserProcess: Send {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;

    async fn ready_state(&mut self) -> Result<ReadyState, BrowserError>;

    async fn read_dom(&mut self) -> Result<RenderedDom, BrowserError>;

    /// Shuts the process down; errors are logged, not returned
    async fn terminate(self: Box<Self>);

    fn is_alive(&self) -> bool;
}
