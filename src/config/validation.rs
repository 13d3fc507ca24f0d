use crate::config::types::{Config, CrawlerConfig, ProgressConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
///
/// Invalid settings fail fast at startup; nothing here is retried.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_progress_config(&config.progress)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_fetches must be between 1 and 100, got {}",
            config.max_concurrent_fetches
        )));
    }

    if config.batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "batch_size must be >= 1, got {}",
            config.batch_size
        )));
    }

    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    if config.memory_threshold_percent <= 0.0 || config.memory_threshold_percent > 100.0 {
        return Err(ConfigError::Validation(format!(
            "memory_threshold_percent must be in (0, 100], got {}",
            config.memory_threshold_percent
        )));
    }

    if config.memory_check_interval_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "memory_check_interval_ms must be >= 100ms, got {}ms",
            config.memory_check_interval_ms
        )));
    }

    Ok(())
}

/// Validates progress configuration
fn validate_progress_config(config: &ProgressConfig) -> Result<(), ConfigError> {
    if config.heartbeat_interval_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "heartbeat_interval_secs must be >= 1, got {}",
            config.heartbeat_interval_secs
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    if !config.contact_email.contains('@') {
        return Err(ConfigError::Validation(format!(
            "contact_email does not look like an email address: '{}'",
            config.contact_email
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &crate::config::types::OutputConfig) -> Result<(), ConfigError> {
    if config.document_dir.is_empty() {
        return Err(ConfigError::Validation(
            "document_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}
