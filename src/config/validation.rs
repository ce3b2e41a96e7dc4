use crate::config::types::{CrawlerConfig, RetryConfig, SiteConfig};
use crate::ConfigError;

/// Validates the entire configuration
///
/// Range and shape checks only; URL patterns and selectors are compiled when
/// adapters are constructed, where unparsable patterns surface as errors.
pub fn validate(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_limits(config)?;
    validate_retry_config(&config.retry)?;
    validate_blocked_hosts(&config.blocked_hosts)?;
    validate_blocked_extensions(&config.blocked_extensions)?;
    validate_sites(&config.sites)?;
    Ok(())
}

/// Validates the global engine limits
fn validate_limits(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent < 1 || config.max_concurrent > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent must be between 1 and 100, got {}",
            config.max_concurrent
        )));
    }

    if config.cache_ttl_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "cache_ttl_secs must be >= 1, got {}",
            config.cache_ttl_secs
        )));
    }

    if config.cache_max_entries < 1 {
        return Err(ConfigError::Validation(format!(
            "cache_max_entries must be >= 1, got {}",
            config.cache_max_entries
        )));
    }

    if config.rate_limit <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "rate_limit must be > 0, got {}",
            config.rate_limit
        )));
    }

    if config.memory_limit_mb < 1 {
        return Err(ConfigError::Validation(format!(
            "memory_limit_mb must be >= 1, got {}",
            config.memory_limit_mb
        )));
    }

    if config.default_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "default_timeout_secs must be >= 1, got {}",
            config.default_timeout_secs
        )));
    }

    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the retry/backoff configuration
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "retry.max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.base_delay_secs <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "retry.base_delay_secs must be > 0, got {}",
            config.base_delay_secs
        )));
    }

    if config.max_delay_secs < config.base_delay_secs {
        return Err(ConfigError::Validation(format!(
            "retry.max_delay_secs must be >= base_delay_secs, got {} < {}",
            config.max_delay_secs, config.base_delay_secs
        )));
    }

    if config.exponential_base < 1.0 {
        return Err(ConfigError::Validation(format!(
            "retry.exponential_base must be >= 1, got {}",
            config.exponential_base
        )));
    }

    if !(0.0..1.0).contains(&config.jitter) {
        return Err(ConfigError::Validation(format!(
            "retry.jitter must be in [0, 1), got {}",
            config.jitter
        )));
    }

    Ok(())
}

/// Validates blocked host entries
fn validate_blocked_hosts(hosts: &[String]) -> Result<(), ConfigError> {
    for host in hosts {
        validate_domain_pattern(host)?;
    }
    Ok(())
}

/// Validates blocked extension entries
fn validate_blocked_extensions(extensions: &[String]) -> Result<(), ConfigError> {
    for extension in extensions {
        if !extension.starts_with('.') || extension.len() < 2 {
            return Err(ConfigError::Validation(format!(
                "Blocked extension '{}' must start with '.' followed by the extension",
                extension
            )));
        }
    }
    Ok(())
}

/// Validates site adapter entries
fn validate_sites(sites: &[SiteConfig]) -> Result<(), ConfigError> {
    for site in sites {
        if site.name.is_empty() {
            return Err(ConfigError::Validation(
                "Site name cannot be empty".to_string(),
            ));
        }

        if site.url_pattern.is_empty() {
            return Err(ConfigError::Validation(format!(
                "Site '{}' must declare a url-pattern",
                site.name
            )));
        }

        if site.rate_limit <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "Site '{}' rate_limit must be > 0, got {}",
                site.name, site.rate_limit
            )));
        }

        if site.max_concurrent < 1 {
            return Err(ConfigError::Validation(format!(
                "Site '{}' max_concurrent must be >= 1, got {}",
                site.name, site.max_concurrent
            )));
        }

        for selector in &site.selectors {
            if selector.name.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "Site '{}' has a selector with an empty name",
                    site.name
                )));
            }
            if selector.selector.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "Selector '{}' of site '{}' cannot be empty",
                    selector.name, site.name
                )));
            }
        }
    }

    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    // Check if it's a wildcard pattern
    if let Some(domain) = pattern.strip_prefix("*.") {
        // Validate the base domain part
        validate_domain_string(domain)?;
    } else {
        // Regular domain
        validate_domain_string(pattern)?;
    }

    Ok(())
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    // Check for invalid characters
    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    // Check that it doesn't start or end with a dot or hyphen
    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    // Check for consecutive dots
    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    Ok(())
}
