//! Runtime facade wiring configuration, logging and the resolver together.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use smelt_runtime::SmeltRuntime;
//!
//! // Auto-loads smelt.toml from the current directory
//! let runtime = SmeltRuntime::new();
//!
//! // Custom configuration path
//! let runtime = SmeltRuntime::builder()
//!     .config_file("config/smelt.toml")
//!     .build()?;
//!
//! let spec = runtime.load_spec("services/web.json")?;
//! let service = runtime.configure(spec, None)?;
//! ```

use std::path::Path;
use std::sync::Arc;

use figment::Figment;
use figment::providers::{Format, Json};
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use smelt_core::{
    FileIdentityStore, IdentityStore, PluginModule, ResolvedService, ServiceSpec,
};
use smelt_framework::{FingerprintOptions, PluginDescriptor, PluginRegistry, ServiceConfigurator};
use tracing::{debug, info};

use crate::config::{ConfigLoader, ConfigResult, SmeltConfig};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;

/// The Smelt runtime: a plugin registry, an identity store and a configurator.
///
/// The registry starts with every descriptor added through
/// [`register_plugin!`](smelt_framework::register_plugin); more modules can be
/// registered at any time.
pub struct SmeltRuntime {
    config: SmeltConfig,
    registry: Arc<PluginRegistry>,
    configurator: ServiceConfigurator,
}

impl SmeltRuntime {
    /// Creates a runtime with automatic configuration loading.
    ///
    /// If no configuration can be loaded, default settings are used.
    pub fn new() -> Self {
        let config = ConfigLoader::new()
            .with_current_dir()
            .load()
            .unwrap_or_else(|e| {
                eprintln!("Warning: Failed to load config ({e}), using defaults");
                SmeltConfig::default()
            });

        Self::from_config(&config)
    }

    /// Creates a runtime builder for custom configuration.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from configuration, with a file-backed identity store.
    ///
    /// Initializes logging from `config.logging` unless a subscriber is
    /// already installed.
    pub fn from_config(config: &SmeltConfig) -> Self {
        let store = FileIdentityStore::new(config.identity.store_dir());
        Self::with_identity_store(config, Arc::new(store))
    }

    /// Creates a runtime from configuration with a caller-supplied identity store.
    pub fn with_identity_store(config: &SmeltConfig, store: Arc<dyn IdentityStore>) -> Self {
        logging::init_from_config(&config.logging);

        let registry = Arc::new(PluginRegistry::collect_all());
        let configurator = ServiceConfigurator::new(registry.clone(), store)
            .base_plugin(config.resolver.base_plugin.clone())
            .fingerprint_options(FingerprintOptions {
                include_timestamp: config.resolver.include_timestamp_in_hash,
            });

        info!(
            log_level = %config.logging.level,
            base_plugin = %config.resolver.base_plugin,
            plugins = registry.len(),
            "Smelt runtime initialized"
        );

        Self {
            config: config.clone(),
            registry,
            configurator,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SmeltConfig {
        &self.config
    }

    /// Returns the plugin registry.
    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    /// Registers a static plugin descriptor.
    pub fn register_plugin(&self, descriptor: PluginDescriptor) {
        self.registry.register_descriptor(descriptor);
    }

    /// Registers a plugin module.
    pub fn register_module<M>(&self, module: M)
    where
        M: PluginModule + 'static,
    {
        self.registry.register(module);
    }

    /// Resolves `spec`, optionally as a reconfiguration of `previous`.
    pub fn configure(
        &self,
        spec: ServiceSpec,
        previous: Option<&ResolvedService>,
    ) -> RuntimeResult<ResolvedService> {
        Ok(self.configurator.config(spec, previous)?)
    }

    /// Reads a [`ServiceSpec`] from a JSON file, or TOML/YAML when the
    /// matching format feature is enabled.
    pub fn load_spec<P: AsRef<Path>>(&self, path: P) -> RuntimeResult<ServiceSpec> {
        load_spec(path)
    }
}

impl Default for SmeltRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads a [`ServiceSpec`] from a file, dispatching on its extension.
pub fn load_spec<P: AsRef<Path>>(path: P) -> RuntimeResult<ServiceSpec> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(RuntimeError::SpecLoad {
            path: path.to_path_buf(),
            reason: "file not found".into(),
        });
    }

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let figment = match ext {
        "json" => Figment::from(Json::file(path)),
        #[cfg(feature = "toml-config")]
        "toml" => Figment::from(Toml::file(path)),
        #[cfg(feature = "yaml-config")]
        "yaml" | "yml" => Figment::from(Yaml::file(path)),
        _ => return Err(RuntimeError::UnsupportedSpecFormat(ext.to_string())),
    };

    let spec: ServiceSpec = figment.extract().map_err(|e| RuntimeError::SpecLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    debug!(path = %path.display(), service_id = %spec.id, "Service spec loaded");
    Ok(spec)
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for creating a [`SmeltRuntime`] with custom configuration.
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    identity_store: Option<Arc<dyn IdentityStore>>,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
            identity_store: None,
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: SmeltConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Uses `store` instead of the configured identity directory.
    pub fn identity_store(mut self, store: Arc<dyn IdentityStore>) -> Self {
        self.identity_store = Some(store);
        self
    }

    /// Builds the runtime.
    pub fn build(self) -> ConfigResult<SmeltRuntime> {
        let config = self.config_loader.load()?;
        Ok(match self.identity_store {
            Some(store) => SmeltRuntime::with_identity_store(&config, store),
            None => SmeltRuntime::from_config(&config),
        })
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
