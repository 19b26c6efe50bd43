//! # Smelt Framework
//!
//! Turns a [`ServiceSpec`](smelt_core::ServiceSpec) into a
//! [`ResolvedService`](smelt_core::ResolvedService).
//!
//! This layer provides:
//! - Plugin descriptors and the `define_plugin!` / `register_plugin!` macros
//! - A name-based plugin registry implementing the capability lookup
//! - The dependency resolver (group chaining, transitive expansion, sink ordering)
//! - The configuration and cache pipelines
//! - Content fingerprinting and identity management
//! - The [`ServiceConfigurator`] entry point composing all of the above
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use smelt_framework::{PluginRegistry, ServiceConfigurator};
//! use smelt_core::{MemoryIdentityStore, ServiceSpec};
//!
//! let registry = Arc::new(PluginRegistry::collect_all());
//! let configurator = ServiceConfigurator::new(registry, Arc::new(MemoryIdentityStore::new()));
//! let service = configurator.config(ServiceSpec::new("svc1", "http"), None)?;
//! ```

pub mod configurator;
pub mod fingerprint;
pub mod identity;
pub mod pipeline;
pub mod plugin;
pub mod registry;
pub mod resolver;

pub use configurator::ServiceConfigurator;
pub use fingerprint::{FingerprintOptions, fingerprint};
pub use identity::IdentityManager;
pub use pipeline::{apply_config, build_cache};
pub use plugin::{PluginDescriptor, PluginMetadata};
pub use registry::PluginRegistry;
pub use resolver::{DEFAULT_BASE_PLUGIN, DependencyResolver, validate_plugin_name};

// Macro-internal re-export (needed by register_plugin! at call sites).
#[doc(hidden)]
pub use linkme;
