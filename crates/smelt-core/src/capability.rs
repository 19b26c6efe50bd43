//! Plugin capability interface.
//!
//! A plugin's behaviour is expressed through up to four optional hooks:
//! `group`, `dependencies`, `config` and `cache`. Every hook has a default
//! that means "not implemented", so a module only overrides what it needs.
//!
//! Modules are located through a [`CapabilityLookup`], which tests replace
//! with a fake registry.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{HookError, ResolveError};
use crate::service::{Config, ServiceContext};

// =============================================================================
// Dependency
// =============================================================================

/// A dependency edge declared by a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Dependency {
    /// Name of the plugin depended upon.
    pub name: String,
    /// Optional edges are dropped silently when the target cannot be located.
    pub optional: bool,
}

impl Dependency {
    /// A mandatory dependency.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: false,
        }
    }

    /// An optional dependency.
    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: true,
        }
    }
}

/// Parses the textual form: `"name"` is mandatory, `"?name"` is optional.
impl FromStr for Dependency {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, optional) = match s.strip_prefix('?') {
            Some(rest) => (rest, true),
            None => (s, false),
        };
        if name.is_empty() {
            return Err(ResolveError::invalid_plugin_name(s));
        }
        Ok(Self {
            name: name.to_string(),
            optional,
        })
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.optional {
            write!(f, "?{}", self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}

// =============================================================================
// Hook outcomes
// =============================================================================

/// Result of a configuration hook that did not fail.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConfigOutcome {
    /// Keep the current configuration.
    #[default]
    Unchanged,
    /// Adopt this configuration for all subsequent plugins.
    Replace(Config),
}

// =============================================================================
// PluginModule
// =============================================================================

/// The code unit implementing zero or more of a plugin's optional hooks.
pub trait PluginModule: Send + Sync {
    /// Registry name of this module.
    fn name(&self) -> &str;

    /// Group this plugin belongs to. Same-group plugins are chained in
    /// request order.
    fn group(&self) -> Option<&str> {
        None
    }

    /// Declared dependencies. The base plugin is implied and need not be listed.
    fn dependencies(&self) -> Vec<Dependency> {
        Vec::new()
    }

    /// Configuration hook, called in dependency order with the current config.
    fn config(
        &self,
        _plugin: &str,
        _config: &Config,
        _service: &ServiceContext,
    ) -> Result<ConfigOutcome, HookError> {
        Ok(ConfigOutcome::Unchanged)
    }

    /// Cache-build hook, called with the finalized config.
    fn cache(
        &self,
        _plugin: &str,
        _config: &Config,
        _service: &ServiceContext,
    ) -> Result<Option<Value>, HookError> {
        Ok(None)
    }
}

impl fmt::Debug for dyn PluginModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginModule")
            .field("name", &self.name())
            .field("group", &self.group())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// CapabilityLookup
// =============================================================================

/// Locates plugin and callback modules by name.
///
/// Returns `None` for unknown names; callers decide whether that is an error.
pub trait CapabilityLookup: Send + Sync {
    /// Locates the module implementing a plugin's hooks.
    fn find_plugin_module(&self, name: &str) -> Option<Arc<dyn PluginModule>>;

    /// Locates the class-level callback module.
    fn find_callback_module(&self, name: &str) -> Option<Arc<dyn PluginModule>>;
}
