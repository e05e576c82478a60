//! Browser session management
//!
//! Rendered fetches run in headless browser processes owned by a bounded
//! [`SessionPool`]. The browser itself sits behind the narrow
//! [`BrowserBackend`]/[`BrowserProcess`] capability traits:
//!
//! - `ChromiumBackend`: headless Chromium via chromiumoxide
//! - `fake::ScriptedBackend`: canned pages for tests, built with the
//!   `test-support` feature

mod backend;
mod chromium;
#[cfg(any(test, feature = "test-support"))]
pub mod fake;
mod pool;
mod session;

pub use backend::{BrowserBackend, BrowserProcess, ReadyState, RenderedDom};
pub use chromium::ChromiumBackend;
pub use pool::{PoolStatus, SessionGuard, SessionPool};
pub use session::{BrowserSession, RetireReason, SessionState};
