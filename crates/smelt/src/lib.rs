//! # Smelt
//!
//! Plugin dependency resolution and service configuration.
//!
//! ## Overview
//!
//! A service is described by a [`ServiceSpec`](core::ServiceSpec): an id, a
//! class naming its callback module, requested plugins and a raw
//! configuration. Smelt resolves it into a
//! [`ResolvedService`](core::ResolvedService):
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌──────────────┐   ┌────────┐   ┌──────────────┐
//! │ identity │──▶│ graph expand │──▶│ config hooks │──▶│ blake3 │──▶│ cache hooks  │
//! └──────────┘   └──────────────┘   └──────────────┘   └────────┘   └──────────────┘
//! ```
//!
//! - **Plugins**: named units with optional group, dependencies, config and cache hooks
//! - **Graph expansion**: base plugin first, same-group chaining, class callback last
//! - **Config pipeline**: each hook may replace the configuration for later plugins
//! - **Fingerprint**: detects no-op reconfigurations
//! - **Identity**: a persisted uuid per service id
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use smelt::prelude::*;
//!
//! fn listen(_: &str, config: &Config, _: &ServiceContext) -> Result<Option<Value>, HookError> {
//!     Ok(config.get("port").cloned())
//! }
//!
//! static HTTP: PluginDescriptor = define_plugin! {
//!     name: "http_callbacks",
//!     cache: listen,
//! };
//! register_plugin!(HTTP);
//!
//! fn main() -> Result<(), RuntimeError> {
//!     let runtime = SmeltRuntime::new();
//!     let spec = ServiceSpec::new("svc1", "http").with_config_value("port", 8080);
//!     let service = runtime.configure(spec, None)?;
//!     println!("{:?}", service.expanded_plugins);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: TOML runtime configuration files (default)
//! - `yaml-config`: YAML runtime configuration files
//! - `json-log`: JSON log output

pub use smelt_core as core;
pub use smelt_framework as framework;
pub use smelt_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use smelt::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use smelt_runtime::{RuntimeError, SmeltConfig, SmeltRuntime};

    // Plugin definition
    pub use smelt_framework::{PluginDescriptor, define_plugin, register_plugin};

    // Data model and hook types
    pub use smelt_core::{
        Config, ConfigOutcome, Dependency, HookError, PluginModule, ResolveError,
        ResolvedService, ServiceContext, ServiceSpec, Uuid, Value,
    };
}
