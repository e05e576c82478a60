use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigResult;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Reads, parses and validates the TOML configuration at `path`
///
/// Sections and keys missing from the file take their default values, so
/// an empty file yields [`Config::default`].
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use linkwell::config::load_config;
///
/// let config = load_config(Path::new("linkwell.toml")).unwrap();
/// println!("Max redirects: {}", config.fetch.max_redirects);
/// ```
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<Config> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Hex-encoded SHA-256 of the raw configuration file
///
/// Logged at startup so a running process can be traced back to the exact
/// configuration it was started with.
pub fn compute_config_hash(path: &Path) -> ConfigResult<String> {
    let content = std::fs::read_to_string(path)?;
    Ok(hex::encode(Sha256::digest(content.as_bytes())))
}

/// [`load_config`] plus [`compute_config_hash`] of the same file
pub fn load_config_with_hash(path: &Path) -> ConfigResult<(Config, String)> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
