use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - sync.concurrency is not 0
/// - fetch.timeout_secs is not 0
/// - fetch.user_agent is not blank
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.sync.concurrency == 0 {
        return Err(ConfigError::ValidationError(
            "sync.concurrency cannot be 0".to_string(),
        ));
    }

    if config.fetch.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "fetch.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.fetch.user_agent.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "fetch.user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}
