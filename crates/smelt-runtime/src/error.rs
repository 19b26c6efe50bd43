//! Runtime error types.

use std::path::PathBuf;

use smelt_core::ResolveError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Service resolution failed.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Runtime configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A service spec file could not be read or parsed.
    #[error("Failed to load service spec from {path}: {reason}")]
    SpecLoad { path: PathBuf, reason: String },

    /// The spec file extension has no enabled format.
    #[error("Unsupported service spec format: .{0}")]
    UnsupportedSpecFormat(String),
}

impl RuntimeError {
    /// Returns the resolution error code, if this is a resolution failure.
    pub fn resolve_code(&self) -> Option<&'static str> {
        match self {
            Self::Resolve(e) => Some(e.code()),
            _ => None,
        }
    }
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
