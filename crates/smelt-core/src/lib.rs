//! Smelt Core - data model and collaborator contracts.
//!
//! This crate provides:
//! - The service data model (`ServiceSpec`, `ResolvedService`, `ServiceContext`)
//! - The unified error taxonomy (`ResolveError`, `HookError`, `CycleError`)
//! - The plugin capability interface (`PluginModule`, `CapabilityLookup`)
//! - The topological sort collaborator (`topological_sort`)
//! - The identity store collaborator (`IdentityStore` and its backends)
//!
//! Higher layers (`smelt-framework`) build the dependency resolver and the
//! configuration pipelines on top of these contracts.

pub mod capability;
pub mod error;
pub mod identity;
pub mod service;
pub mod toposort;

pub use capability::{CapabilityLookup, ConfigOutcome, Dependency, PluginModule};
pub use error::{
    CycleError, HookError, IdentityStoreError, ResolveError, ResolveResult,
};
pub use identity::{
    FileIdentityStore, IdentityStore, MemoryIdentityStore, format_identity_record,
    parse_identity_record,
};
pub use service::{Config, ResolvedService, ServiceContext, ServiceSpec};
pub use toposort::{DependencyGraph, topological_sort, topological_sort_by};

pub use serde_json::Value;
pub use uuid::Uuid;
