//! Configuration validation utilities.

use smelt_framework::validate_plugin_name;

use super::error::{ConfigError, ConfigResult};
use super::schema::{IdentityConfig, LogOutput, LoggingConfig, ResolverConfig, SmeltConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &SmeltConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_identity_config(&config.identity)?;
    validate_resolver_config(&config.resolver)?;
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    if let Some(target) = logging.filters.keys().find(|t| t.trim().is_empty()) {
        return Err(ConfigError::validation(format!(
            "Log filter target cannot be blank: {target:?}"
        )));
    }

    Ok(())
}

fn validate_identity_config(identity: &IdentityConfig) -> ConfigResult<()> {
    if identity
        .dir
        .as_ref()
        .is_some_and(|dir| dir.as_os_str().is_empty())
    {
        return Err(ConfigError::validation("identity.dir cannot be empty"));
    }
    Ok(())
}

fn validate_resolver_config(resolver: &ResolverConfig) -> ConfigResult<()> {
    if resolver.base_plugin.is_empty() {
        return Err(ConfigError::missing_field("resolver.base_plugin"));
    }

    validate_plugin_name(&resolver.base_plugin).map_err(|e| {
        ConfigError::validation(format!("resolver.base_plugin: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&SmeltConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_file_output_needs_path() {
        let mut config = SmeltConfig::default();
        config.logging.output = LogOutput::File;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { ref field }) if field == "logging.file_path"
        ));

        config.logging.file_path = Some(PathBuf::from("smelt.log"));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_base_plugin() {
        let mut config = SmeltConfig::default();
        config.resolver.base_plugin = String::new();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { .. })
        ));

        config.resolver.base_plugin = "?base".into();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_validate_empty_identity_dir() {
        let mut config = SmeltConfig::default();
        config.identity.dir = Some(PathBuf::new());
        assert!(validate_config(&config).is_err());
    }
}
