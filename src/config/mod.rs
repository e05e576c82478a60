//! Configuration module for Linkwell
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use linkwell::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("linkwell.toml")).unwrap();
//! println!("Browser pool capacity: {}", config.browser.pool_capacity);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserPoolConfig, Config, EscalationConfig, ExtractionConfig, FetchConfig, HealthConfig,
    MarkdownConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
