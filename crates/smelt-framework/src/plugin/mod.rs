//! Plugin system for the Smelt framework.
//!
//! # Architecture
//!
//! A plugin is a named unit of service behaviour with up to four optional
//! hooks. The framework talks to plugins only through the
//! [`PluginModule`](smelt_core::PluginModule) trait; a [`PluginDescriptor`] is
//! the static, `Copy` implementation of that trait produced by
//! [`define_plugin!`](crate::define_plugin).
//!
//! ```rust,ignore
//! use smelt_framework::{define_plugin, register_plugin};
//! use smelt_framework::plugin::PluginDescriptor;
//! use smelt_core::{Config, ConfigOutcome, HookError, ServiceContext};
//!
//! fn auth_config(
//!     _plugin: &str,
//!     config: &Config,
//!     _service: &ServiceContext,
//! ) -> Result<ConfigOutcome, HookError> {
//!     let mut config = config.clone();
//!     config.entry("auth_realm").or_insert("default".into());
//!     Ok(ConfigOutcome::Replace(config))
//! }
//!
//! pub static AUTH: PluginDescriptor = define_plugin! {
//!     name: "auth",
//!     group: "security",
//!     depends_on: ["?metrics"],
//!     config: auth_config,
//! };
//!
//! register_plugin!(AUTH);
//! ```
//!
//! # Dependencies
//!
//! `depends_on` entries use the textual form understood by
//! [`Dependency`](smelt_core::Dependency): `"db"` is mandatory, `"?metrics"`
//! is optional and silently dropped when no module can be located. Every
//! plugin implicitly depends on the base plugin ([`BASE`]).

pub mod builtin;
pub mod descriptor;
pub mod macros;

pub use builtin::{BASE, PLUGIN_REGISTRY};
pub use descriptor::{
    CacheHookFn, ConfigHookFn, PluginDescriptor, PluginMetadata, SMELT_PLUGIN_API_VERSION,
};
