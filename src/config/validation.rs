use crate::config::types::{
    Config, CrawlerConfig, RobotsConfig, SearchConfig, StorageConfig, UserAgentConfig,
    MAX_CRAWL_DELAY_SECS,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_robots_config(&config.robots)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_storage_config(&config.storage)?;
    validate_search_config(&config.search)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.allowed_schemes.is_empty() {
        return Err(ConfigError::Validation(
            "allowed_schemes cannot be empty".to_string(),
        ));
    }

    for scheme in &config.allowed_schemes {
        if scheme != "http" && scheme != "https" {
            return Err(ConfigError::Validation(format!(
                "allowed_schemes may only contain http and https, got '{}'",
                scheme
            )));
        }
    }

    if config.max_fetch_bytes == 0 {
        return Err(ConfigError::Validation(
            "max_fetch_bytes must be >= 1".to_string(),
        ));
    }

    if config.fetch_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "fetch_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.dns_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "dns_timeout_secs must be >= 1".to_string(),
        ));
    }

    if !config.max_crawl_delay_secs.is_finite() || config.max_crawl_delay_secs < 0.0 {
        return Err(ConfigError::Validation(format!(
            "max_crawl_delay_secs must be a non-negative number, got {}",
            config.max_crawl_delay_secs
        )));
    }

    if config.max_crawl_delay_secs > MAX_CRAWL_DELAY_SECS {
        return Err(ConfigError::Validation(format!(
            "max_crawl_delay_secs must be at most {}, got {}",
            MAX_CRAWL_DELAY_SECS, config.max_crawl_delay_secs
        )));
    }

    Ok(())
}

fn validate_robots_config(config: &RobotsConfig) -> Result<(), ConfigError> {
    if config.fetch_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "robots fetch_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.max_bytes == 0 {
        return Err(ConfigError::Validation(
            "robots max_bytes must be >= 1".to_string(),
        ));
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
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters, hyphens and underscores, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    if config.default_limit == 0 {
        return Err(ConfigError::Validation(
            "default_limit must be >= 1".to_string(),
        ));
    }

    Ok(())
}
