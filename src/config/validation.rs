use crate::config::types::{Config, MinerConfig, OutputConfig, SessionConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_miner_config(&config.miner)?;
    validate_session_config(&config.session)?;
    validate_output_config(&config.output)?;
    Ok(())
}

fn validate_miner_config(config: &MinerConfig) -> Result<(), ConfigError> {
    if config.worker_count < 1 {
        return Err(ConfigError::Validation(format!(
            "worker-count must be >= 1, got {}",
            config.worker_count
        )));
    }

    if config.queue_capacity < 1 {
        return Err(ConfigError::Validation(format!(
            "queue-capacity must be >= 1, got {}",
            config.queue_capacity
        )));
    }

    Ok(())
}

fn validate_session_config(config: &SessionConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' cannot be used as a base",
            config.base_url
        )));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "connect-timeout-secs must be >= 1".to_string(),
        ));
    }

    if let Some(agent) = &config.user_agent {
        if agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "user-agent cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.cache_to_per_item_files && config.combined_output_path.is_some() {
        return Err(ConfigError::Validation(
            "cache-to-per-item-files and combined-output-path are mutually exclusive".to_string(),
        ));
    }

    if config.cache_directory.is_empty() {
        return Err(ConfigError::Validation(
            "cache-directory cannot be empty".to_string(),
        ));
    }

    if matches!(&config.combined_output_path, Some(path) if path.is_empty()) {
        return Err(ConfigError::Validation(
            "combined-output-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
