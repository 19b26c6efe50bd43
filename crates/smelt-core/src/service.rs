//! Service data model.
//!
//! A [`ServiceSpec`] is the proposed configuration submitted by a caller; a
//! [`ResolvedService`] is what comes out of a successful resolution. Plugin
//! hooks only ever see a read-only [`ServiceContext`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// The plugins' shared configuration substrate: string keys to arbitrary values.
pub type Config = Map<String, Value>;

// =============================================================================
// ServiceSpec
// =============================================================================

/// Declarative description of a service, as submitted for resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    /// Stable service name. Immutable once set.
    pub id: String,

    /// Names the callback module governing this service. Immutable once set.
    pub class: String,

    /// Identity; must match any previously assigned value when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,

    /// Requested plugins; `None` defaults to the previous service's list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugins: Option<Vec<String>>,

    /// Raw configuration handed to the plugin hooks.
    #[serde(default)]
    pub config: Config,
}

impl ServiceSpec {
    /// Creates a spec with no plugins and an empty configuration.
    pub fn new(id: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            class: class.into(),
            uuid: None,
            plugins: None,
            config: Config::new(),
        }
    }

    /// Sets the requested plugin list.
    pub fn with_plugins<I, S>(mut self, plugins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.plugins = Some(plugins.into_iter().map(Into::into).collect());
        self
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Sets a single configuration key.
    pub fn with_config_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    /// Pins the service identity.
    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = Some(uuid);
        self
    }
}

// =============================================================================
// ResolvedService
// =============================================================================

/// A fully resolved service: the spec plus everything derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedService {
    pub id: String,
    pub class: String,
    pub uuid: Uuid,
    /// Requested plugins after defaulting from the previous service.
    pub plugins: Vec<String>,
    /// Configuration after every configuration hook ran.
    pub config: Config,
    pub timestamp: DateTime<Utc>,
    /// Processing order, dependencies first; the class callback is last.
    pub expanded_plugins: Vec<String>,
    /// Content fingerprint used for change detection.
    pub hash: String,
    /// Per-plugin values produced by the cache-build hooks.
    #[serde(default)]
    pub config_cache: BTreeMap<String, Value>,
}

impl ResolvedService {
    /// Returns the cache value built by `plugin`, if any.
    pub fn cache_for(&self, plugin: &str) -> Option<&Value> {
        self.config_cache.get(plugin)
    }

    /// Returns `true` if `name` is part of the expanded plugin list.
    pub fn has_plugin(&self, name: &str) -> bool {
        self.expanded_plugins.iter().any(|p| p == name)
    }

    /// Returns `true` if both resolutions carry the same fingerprint.
    ///
    /// A reconfiguration for which this holds is a no-op.
    pub fn is_same_config(&self, other: &ResolvedService) -> bool {
        self.hash == other.hash
    }

    /// Builds a spec that resubmits this service unchanged.
    pub fn to_spec(&self) -> ServiceSpec {
        ServiceSpec {
            id: self.id.clone(),
            class: self.class.clone(),
            uuid: Some(self.uuid),
            plugins: Some(self.plugins.clone()),
            config: self.config.clone(),
        }
    }
}

// =============================================================================
// ServiceContext
// =============================================================================

/// Read-only view of the service being resolved, handed to plugin hooks.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceContext {
    pub id: String,
    pub class: String,
    pub uuid: Uuid,
    pub timestamp: DateTime<Utc>,
    pub plugins: Vec<String>,
    /// Empty until the dependency graph has been resolved.
    pub expanded_plugins: Vec<String>,
    /// Only set during the cache phase.
    pub hash: Option<String>,
}

impl ServiceContext {
    /// Creates a context for a service whose graph is not resolved yet.
    pub fn new(
        id: impl Into<String>,
        class: impl Into<String>,
        uuid: Uuid,
        timestamp: DateTime<Utc>,
        plugins: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            class: class.into(),
            uuid,
            timestamp,
            plugins,
            expanded_plugins: Vec::new(),
            hash: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_spec_deserialize_defaults() {
        let spec: ServiceSpec =
            serde_json::from_value(json!({ "id": "svc1", "class": "http" })).unwrap();
        assert_eq!(spec, ServiceSpec::new("svc1", "http"));
        assert!(spec.plugins.is_none());
        assert!(spec.config.is_empty());
    }

    #[test]
    fn test_spec_builder() {
        let spec = ServiceSpec::new("svc1", "http")
            .with_plugins(["auth"])
            .with_config_value("port", 8080);
        assert_eq!(spec.plugins, Some(vec!["auth".to_string()]));
        assert_eq!(spec.config.get("port"), Some(&json!(8080)));
    }

    #[test]
    fn test_resolved_to_spec() {
        let resolved = ResolvedService {
            id: "svc1".into(),
            class: "http".into(),
            uuid: Uuid::new_v4(),
            plugins: vec!["auth".into()],
            config: Config::new(),
            timestamp: Utc::now(),
            expanded_plugins: vec!["base".into(), "auth".into(), "http".into()],
            hash: "abc".into(),
            config_cache: BTreeMap::new(),
        };
        let spec = resolved.to_spec();
        assert_eq!(spec.uuid, Some(resolved.uuid));
        assert_eq!(spec.plugins.as_deref(), Some(&["auth".to_string()][..]));
        assert!(resolved.has_plugin("auth"));
        assert!(!resolved.has_plugin("db"));
    }
}
