use crate::config::types::{
    BrowserPoolConfig, Config, EscalationConfig, ExtractionConfig, FetchConfig, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetch_config(&config.fetch)?;
    validate_escalation_config(&config.escalation)?;
    validate_browser_config(&config.browser)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_extraction_config(&config.extraction)?;
    Ok(())
}

/// Validates direct fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "fetch.timeout-ms must be greater than 0".to_string(),
        ));
    }

    if config.connect_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "fetch.connect-timeout-ms must be greater than 0".to_string(),
        ));
    }

    if config.retries > 10 {
        return Err(ConfigError::Validation(format!(
            "fetch.retries must be at most 10, got {}",
            config.retries
        )));
    }

    if config.max_outbound_connections == 0 {
        return Err(ConfigError::Validation(
            "fetch.max-outbound-connections must be at least 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates escalation thresholds
fn validate_escalation_config(config: &EscalationConfig) -> Result<(), ConfigError> {
    if let Some(marker) = config
        .shell_markers
        .iter()
        .find(|m| m.trim().is_empty() || m.chars().any(char::is_whitespace))
    {
        return Err(ConfigError::Validation(format!(
            "escalation.shell-markers entries must be non-empty element ids, got '{}'",
            marker
        )));
    }

    Ok(())
}

/// Validates browser pool configuration
fn validate_browser_config(config: &BrowserPoolConfig) -> Result<(), ConfigError> {
    if config.pool_capacity < 1 || config.pool_capacity > 64 {
        return Err(ConfigError::Validation(format!(
            "browser.pool-capacity must be between 1 and 64, got {}",
            config.pool_capacity
        )));
    }

    if config.acquire_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "browser.acquire-timeout-ms must be greater than 0".to_string(),
        ));
    }

    if config.navigation_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "browser.navigation-timeout-ms must be greater than 0".to_string(),
        ));
    }

    if config.ready_poll_interval_ms == 0 {
        return Err(ConfigError::Validation(
            "browser.ready-poll-interval-ms must be greater than 0".to_string(),
        ));
    }

    if config.max_session_requests == 0 {
        return Err(ConfigError::Validation(
            "browser.max-session-requests must be at least 1".to_string(),
        ));
    }

    if config.settle_delay_ms >= config.navigation_timeout_ms {
        return Err(ConfigError::Validation(format!(
            "browser.settle-delay-ms ({}) must be shorter than browser.navigation-timeout-ms ({})",
            config.settle_delay_ms, config.navigation_timeout_ms
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if let Some(contact_url) = &config.contact_url {
        Url::parse(contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;
    }

    Ok(())
}

/// Validates extraction configuration
fn validate_extraction_config(config: &ExtractionConfig) -> Result<(), ConfigError> {
    for ext in &config.excluded_extensions {
        if !ext.starts_with('.') || ext.len() < 2 {
            return Err(ConfigError::Validation(format!(
                "extraction.excluded-extensions entries must look like '.pdf', got '{}'",
                ext
            )));
        }
    }

    Ok(())
}
