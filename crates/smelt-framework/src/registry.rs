//! Name-based plugin registry.
//!
//! [`PluginRegistry`] is the default [`CapabilityLookup`]. Modules are keyed by
//! [`PluginModule::name`]. Lookups follow a naming convention:
//!
//! - plugin `auth` resolves to a module named `auth_plugin`, else `auth`;
//! - class `http` resolves to a module named `http_callbacks`, else `http`.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use smelt_core::{CapabilityLookup, PluginModule};
use tracing::{debug, warn};

use crate::plugin::{BASE, PLUGIN_REGISTRY, PluginDescriptor, SMELT_PLUGIN_API_VERSION};

/// Suffix tried first when locating a plugin module.
pub const PLUGIN_MODULE_SUFFIX: &str = "_plugin";

/// Suffix tried first when locating a class callback module.
pub const CALLBACK_MODULE_SUFFIX: &str = "_callbacks";

/// Thread-safe registry of plugin modules.
#[derive(Default)]
pub struct PluginRegistry {
    modules: RwLock<HashMap<String, Arc<dyn PluginModule>>>,
}

impl PluginRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in plugins only.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register_descriptor(BASE);
        registry
    }

    /// Builds a registry from every descriptor added with
    /// [`register_plugin!`](crate::register_plugin).
    ///
    /// If multiple descriptors share a name a warning is emitted and the
    /// **first** one wins.
    pub fn collect_all() -> Self {
        let registry = Self::new();
        for desc in PLUGIN_REGISTRY.iter() {
            if registry.contains(desc.name) {
                warn!(
                    plugin = desc.name,
                    "Multiple plugin descriptors registered under one name, using first"
                );
                continue;
            }
            registry.register_descriptor(**desc);
        }
        debug!(count = registry.len(), "Collected static plugin descriptors");
        registry
    }

    /// Registers a module under its own name. The last registration wins.
    pub fn register<M>(&self, module: M)
    where
        M: PluginModule + 'static,
    {
        self.register_arc(Arc::new(module));
    }

    /// Registers a shared module under its own name. The last registration wins.
    pub fn register_arc(&self, module: Arc<dyn PluginModule>) {
        let name = module.name().to_string();
        if self.modules.write().insert(name.clone(), module).is_some() {
            warn!(plugin = %name, "Duplicate plugin module, last registration wins");
        } else {
            debug!(plugin = %name, "Plugin module registered");
        }
    }

    /// Registers a static descriptor.
    ///
    /// Logs a warning when the API version does not match, but continues.
    pub fn register_descriptor(&self, desc: PluginDescriptor) {
        if !desc.is_compatible() {
            warn!(
                plugin = desc.name,
                descriptor_version = %format!(
                    "{}.{}",
                    desc.api_version >> 16,
                    desc.api_version & 0xFFFF
                ),
                host_version = %format!(
                    "{}.{}",
                    SMELT_PLUGIN_API_VERSION >> 16,
                    SMELT_PLUGIN_API_VERSION & 0xFFFF
                ),
                "Plugin API version mismatch, registering anyway"
            );
        }
        self.register(desc);
    }

    /// Removes a module by exact name. Returns `true` if it was present.
    pub fn unregister(&self, name: &str) -> bool {
        self.modules.write().remove(name).is_some()
    }

    /// Returns the module registered under exactly `name`.
    pub fn get(&self, name: &str) -> Option<Arc<dyn PluginModule>> {
        self.modules.read().get(name).cloned()
    }

    /// Returns `true` if a module is registered under exactly `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.modules.read().contains_key(name)
    }

    /// Returns all registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.modules.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the number of registered modules.
    pub fn len(&self) -> usize {
        self.modules.read().len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.modules.read().is_empty()
    }

    fn find_with_suffix(&self, name: &str, suffix: &str) -> Option<Arc<dyn PluginModule>> {
        let modules = self.modules.read();
        modules
            .get(&format!("{name}{suffix}"))
            .or_else(|| modules.get(name))
            .cloned()
    }
}

impl CapabilityLookup for PluginRegistry {
    fn find_plugin_module(&self, name: &str) -> Option<Arc<dyn PluginModule>> {
        self.find_with_suffix(name, PLUGIN_MODULE_SUFFIX)
    }

    fn find_callback_module(&self, name: &str) -> Option<Arc<dyn PluginModule>> {
        self.find_with_suffix(name, CALLBACK_MODULE_SUFFIX)
    }
}
