use crate::config::types::{Config, CrawlerConfig, NetworkConfig, OutputConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound on the worker pool size
pub const MAX_WORKERS: usize = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_network_config(&config.network)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    if config.link_limit < 1 {
        return Err(ConfigError::Validation(
            "link_limit must be >= 1".to_string(),
        ));
    }

    if config.paragraph_limit < 1 {
        return Err(ConfigError::Validation(
            "paragraph_limit must be >= 1".to_string(),
        ));
    }

    if config.stored_link_limit < config.link_limit {
        return Err(ConfigError::Validation(format!(
            "stored_link_limit ({}) must be >= link_limit ({})",
            config.stored_link_limit, config.link_limit
        )));
    }

    Ok(())
}

/// Validates the network path
fn validate_network_config(config: &NetworkConfig) -> Result<(), ConfigError> {
    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if let Some(proxy) = &config.proxy {
        let url = Url::parse(proxy)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy '{}': {}", proxy, e)))?;

        match url.scheme() {
            "socks5" | "socks5h" | "http" | "https" => {}
            other => {
                return Err(ConfigError::Validation(format!(
                    "Unsupported proxy scheme '{}'",
                    other
                )))
            }
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
