use crate::config::types::{Config, CrawlerConfig, FilterConfig, HttpConfig};
use crate::crawler::LinkExtractor;
use crate::url::parse_seed;
use crate::ConfigError;
use regex::Regex;

/// Upper bound on the worker count
const MAX_WORKERS: usize = 1024;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_http_config(&config.http)?;
    if let Some(filters) = &config.filters {
        validate_filters(filters)?;
    }
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    parse_seed(&config.seed).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", config.seed, e))
    })?;

    if let Some(host) = &config.host {
        validate_host(host)?;
    }

    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    if config.queue_capacity < 1 {
        return Err(ConfigError::Validation(format!(
            "queue_capacity must be >= 1, got {}",
            config.queue_capacity
        )));
    }

    if let Some(pattern) = &config.link_pattern {
        LinkExtractor::with_pattern(pattern)?;
    }

    Ok(())
}

/// Validates HTTP client configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "connect_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates the ordered filter list
fn validate_filters(filters: &[FilterConfig]) -> Result<(), ConfigError> {
    for filter in filters {
        match filter {
            FilterConfig::IncludePattern { pattern } | FilterConfig::ExcludePattern { pattern } => {
                Regex::new(pattern).map_err(|e| {
                    ConfigError::InvalidPattern(format!("'{}': {}", pattern, e))
                })?;
            }
            FilterConfig::PathPrefix { prefix } => {
                if !prefix.starts_with('/') {
                    return Err(ConfigError::Validation(format!(
                        "path prefix '{}' must start with '/'",
                        prefix
                    )));
                }
            }
            FilterConfig::HostContains | FilterConfig::HostEquals => {}
        }
    }
    Ok(())
}

/// Validates a scope host (host name or IP, with an optional port)
fn validate_host(host: &str) -> Result<(), ConfigError> {
    if host.is_empty() {
        return Err(ConfigError::Validation("host cannot be empty".to_string()));
    }

    if !host
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | ':' | '[' | ']'))
    {
        return Err(ConfigError::Validation(format!(
            "host '{}' contains invalid characters",
            host
        )));
    }

    if host.starts_with('.') || host.starts_with('-') {
        return Err(ConfigError::Validation(format!(
            "host '{}' cannot start with '.' or '-'",
            host
        )));
    }

    Ok(())
}
