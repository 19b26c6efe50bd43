//! Plugin descriptor: the static, `Copy` handle to a plugin.

use std::fmt;

use serde_json::Value;
use smelt_core::{Config, ConfigOutcome, Dependency, HookError, PluginModule, ServiceContext};

// ─── API versioning ─────────────────────────────────────────────────────────────

/// Current Smelt plugin API version (1.0).
pub const SMELT_PLUGIN_API_VERSION: u32 = 0x0001_0000;

// ─── Hook function types ───────────────────────────────────────────────────────

/// Configuration hook: `(plugin, current_config, service) -> outcome`.
pub type ConfigHookFn = fn(&str, &Config, &ServiceContext) -> Result<ConfigOutcome, HookError>;

/// Cache-build hook: `(plugin, final_config, service) -> cache value`.
pub type CacheHookFn = fn(&str, &Config, &ServiceContext) -> Result<Option<Value>, HookError>;

// ─── PluginMetadata ─────────────────────────────────────────────────────────────

/// Descriptive metadata attached to every plugin.
///
/// `version` defaults to `CARGO_PKG_VERSION` of the crate that defined the
/// plugin; `desc` to its `CARGO_PKG_DESCRIPTION`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginMetadata {
    /// Semver version string of the plugin.
    pub version: &'static str,
    /// One-line description shown in logs.
    pub desc: &'static str,
}

// ─── PluginDescriptor ───────────────────────────────────────────────────────────

/// A static, `Copy` descriptor implementing [`PluginModule`].
///
/// Use the [`define_plugin!`](crate::define_plugin) macro to create one.
#[derive(Clone, Copy)]
pub struct PluginDescriptor {
    /// Plugin API version this descriptor was compiled against.
    pub api_version: u32,

    /// Registry name.
    pub name: &'static str,

    /// Group used to chain same-category plugins.
    pub group: Option<&'static str>,

    /// Dependencies in textual form (`"name"` or `"?name"`).
    pub depends_on: &'static [&'static str],

    /// Configuration hook.
    pub config: Option<ConfigHookFn>,

    /// Cache-build hook.
    pub cache: Option<CacheHookFn>,

    /// Static metadata snapshot for this plugin.
    pub metadata: PluginMetadata,
}

impl PluginDescriptor {
    /// Returns `true` if this descriptor's API version is compatible with the
    /// running framework.
    ///
    /// The major part must match exactly; the descriptor's minor part must be
    /// ≤ the host's minor part.
    pub fn is_compatible(&self) -> bool {
        let host_major = SMELT_PLUGIN_API_VERSION >> 16;
        let desc_major = self.api_version >> 16;
        let desc_minor = self.api_version & 0xFFFF;
        let host_minor = SMELT_PLUGIN_API_VERSION & 0xFFFF;
        desc_major == host_major && desc_minor <= host_minor
    }

    /// Returns this plugin's static [`PluginMetadata`].
    #[inline]
    pub fn metadata(&self) -> PluginMetadata {
        self.metadata
    }
}

impl PluginModule for PluginDescriptor {
    fn name(&self) -> &str {
        self.name
    }

    fn group(&self) -> Option<&str> {
        self.group
    }

    fn dependencies(&self) -> Vec<Dependency> {
        // Unparseable entries are kept verbatim so the resolver rejects them.
        self.depends_on
            .iter()
            .map(|raw| raw.parse().unwrap_or_else(|_| Dependency::required(*raw)))
            .collect()
    }

    fn config(
        &self,
        plugin: &str,
        config: &Config,
        service: &ServiceContext,
    ) -> Result<ConfigOutcome, HookError> {
        match self.config {
            Some(hook) => hook(plugin, config, service),
            None => Ok(ConfigOutcome::Unchanged),
        }
    }

    fn cache(
        &self,
        plugin: &str,
        config: &Config,
        service: &ServiceContext,
    ) -> Result<Option<Value>, HookError> {
        match self.cache {
            Some(hook) => hook(plugin, config, service),
            None => Ok(None),
        }
    }
}

impl fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("api_version", &self.api_version)
            .field("name", &self.name)
            .field("group", &self.group)
            .field("depends_on", &self.depends_on)
            .field("config", &self.config.is_some())
            .field("cache", &self.cache.is_some())
            .field("metadata", &self.metadata)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(depends_on: &'static [&'static str]) -> PluginDescriptor {
        PluginDescriptor {
            api_version: SMELT_PLUGIN_API_VERSION,
            name: "auth",
            group: None,
            depends_on,
            config: None,
            cache: None,
            metadata: PluginMetadata {
                version: "1.0.0",
                desc: "",
            },
        }
    }

    #[test]
    fn test_compatibility() {
        let mut desc = descriptor(&[]);
        assert!(desc.is_compatible());
        desc.api_version = 0x0002_0000;
        assert!(!desc.is_compatible());
        desc.api_version = 0x0001_0001;
        assert!(!desc.is_compatible());
    }

    #[test]
    fn test_dependencies_parse_textual_form() {
        let desc = descriptor(&["db", "?metrics", "?"]);
        assert_eq!(
            desc.dependencies(),
            vec![
                Dependency::required("db"),
                Dependency::optional("metrics"),
                Dependency::required("?"),
            ]
        );
    }
}
