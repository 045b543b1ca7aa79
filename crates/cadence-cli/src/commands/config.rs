//! Configuration commands.

use std::path::Path;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Renders the current configuration as TOML.
pub fn dump(config: &ClientConfig) -> ClientResult<String> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))?;
    Ok(format!(
        "# config.toml ({})\n{}",
        ClientConfig::default_path().display(),
        toml_str
    ))
}

/// Validates the configuration.
pub fn validate(config: &ClientConfig) -> ClientResult<String> {
    config.validate().map_err(ClientError::Config)?;
    Ok("Configuration is valid.".to_string())
}

/// Shows the configuration and catalog paths.
pub fn path(config: &ClientConfig, store_override: Option<&Path>) -> ClientResult<String> {
    Ok(format!(
        "config: {}\ncatalog: {}",
        ClientConfig::default_path().display(),
        config.store_config(store_override).path.display()
    ))
}
