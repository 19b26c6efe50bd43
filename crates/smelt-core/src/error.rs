//! Unified error types for service resolution.
//!
//! Every variant of [`ResolveError`] is terminal for the resolution attempt in
//! progress. Identity store failures are kept in a separate type because they
//! are logged and downgraded instead of propagated.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

// =============================================================================
// Resolve Errors
// =============================================================================

/// Errors that abort a service resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The spec's uuid conflicts with the one already assigned.
    #[error("uuid cannot be updated: '{previous}' -> '{requested}'")]
    UuidCannotBeUpdated {
        /// Uuid already assigned to the service.
        previous: Uuid,
        /// Uuid supplied by the new spec.
        requested: Uuid,
    },

    /// The spec's id differs from the previous service's id.
    #[error("id cannot be updated: '{previous}' -> '{requested}'")]
    IdCannotBeUpdated {
        /// Id of the previous service.
        previous: String,
        /// Id supplied by the new spec.
        requested: String,
    },

    /// The spec's class differs from the previous service's class.
    #[error("class cannot be updated: '{previous}' -> '{requested}'")]
    ClassCannotBeUpdated {
        /// Class of the previous service.
        previous: String,
        /// Class supplied by the new spec.
        requested: String,
    },

    /// The service class has no locatable callback module.
    #[error("package class '{0}' is invalid: no callback module found")]
    PackageClassInvalid(String),

    /// A requested plugin or mandatory dependency has no locatable module.
    #[error("plugin '{0}' is unknown")]
    PluginUnknown(String),

    /// A malformed plugin name was found during expansion.
    #[error("invalid plugin name: {0:?}")]
    InvalidPluginName(String),

    /// The expanded dependency graph is not a DAG.
    #[error(transparent)]
    Cycle(#[from] CycleError),

    /// A plugin's configuration hook signalled failure.
    #[error("service config error in plugin '{plugin}': {reason}")]
    ServiceConfig {
        /// Plugin whose hook failed.
        plugin: String,
        /// Error payload returned by the hook.
        reason: HookError,
    },

    /// A plugin's cache-build hook signalled failure.
    #[error("cache build error in plugin '{plugin}': {reason}")]
    CacheBuild {
        /// Plugin whose hook failed.
        plugin: String,
        /// Error payload returned by the hook.
        reason: HookError,
    },

    /// The resolved configuration could not be serialized for hashing.
    #[error("failed to fingerprint service: {0}")]
    Fingerprint(String),
}

impl ResolveError {
    /// Returns the stable snake_case code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UuidCannotBeUpdated { .. } => "uuid_cannot_be_updated",
            Self::IdCannotBeUpdated { .. } => "id_cannot_be_updated",
            Self::ClassCannotBeUpdated { .. } => "class_cannot_be_updated",
            Self::PackageClassInvalid(_) => "package_class_invalid",
            Self::PluginUnknown(_) => "plugin_unknown",
            Self::InvalidPluginName(_) => "invalid_plugin_name",
            Self::Cycle(_) => "cycle",
            Self::ServiceConfig { .. } => "service_config_error",
            Self::CacheBuild { .. } => "service_cache_error",
            Self::Fingerprint(_) => "fingerprint_error",
        }
    }

    /// Creates a plugin-unknown error.
    pub fn plugin_unknown(name: impl Into<String>) -> Self {
        Self::PluginUnknown(name.into())
    }

    /// Creates an invalid-plugin-name error.
    pub fn invalid_plugin_name(name: impl Into<String>) -> Self {
        Self::InvalidPluginName(name.into())
    }
}

/// Result type for resolution operations.
pub type ResolveResult<T> = Result<T, ResolveError>;

// =============================================================================
// Cycle Error
// =============================================================================

/// Diagnostic produced by the topological sort when the graph has a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("dependency cycle detected among: {}", nodes.join(", "))]
pub struct CycleError {
    /// Nodes that could not be ordered, sorted by name.
    pub nodes: Vec<String>,
}

// =============================================================================
// Hook Error
// =============================================================================

/// Error payload returned by a plugin hook.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HookError(String);

impl HookError {
    /// Creates a hook error from any displayable value.
    pub fn new(reason: impl fmt::Display) -> Self {
        Self(reason.to_string())
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl From<String> for HookError {
    fn from(reason: String) -> Self {
        Self(reason)
    }
}

impl From<&str> for HookError {
    fn from(reason: &str) -> Self {
        Self(reason.to_string())
    }
}

impl From<serde_json::Error> for HookError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err)
    }
}

// =============================================================================
// Identity Store Errors
// =============================================================================

/// Errors raised by an [`IdentityStore`](crate::identity::IdentityStore) backend.
#[derive(Debug, Error)]
pub enum IdentityStoreError {
    /// I/O error while reading or writing a record.
    #[error("identity store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The service id cannot be used as a record key.
    #[error("invalid identity key: {0:?}")]
    InvalidKey(String),
}
