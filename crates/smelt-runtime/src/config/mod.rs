//! Configuration module for the Smelt runtime.
//!
//! This module provides layered configuration loading and validation for
//! logging, identity persistence and resolver settings.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    IdentityConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, ResolverConfig, SmeltConfig,
    SpanEventConfig,
};
pub use validation::validate_config;
