//! URL handling module for Linkwell
//!
//! This module provides target validation, href resolution and
//! canonicalization, the ordered deduplicating link set, and the
//! internal/external host test used by scope filters.

mod domain;
mod normalize;
mod set;

// Re-export main functions
pub use domain::{extract_domain, is_internal};
pub use normalize::{normalize, validate_target, NormalizedUrl, Rejection};
pub use set::LinkSet;
