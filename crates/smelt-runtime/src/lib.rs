//! Smelt Runtime - configuration, logging and the runtime facade.
//!
//! This crate provides:
//! - Layered runtime configuration (`SmeltConfig`, `ConfigLoader`)
//! - Logging setup over `tracing-subscriber` (`LoggingBuilder`)
//! - The `SmeltRuntime` facade owning the plugin registry and identity store
//!
//! ```ignore
//! use smelt_runtime::SmeltRuntime;
//! use smelt_core::ServiceSpec;
//!
//! fn main() -> anyhow::Result<()> {
//!     let runtime = SmeltRuntime::new();
//!     let spec = ServiceSpec::new("svc1", "http").with_plugins(["auth"]);
//!     let service = runtime.configure(spec, None)?;
//!     println!("{} -> {:?}", service.uuid, service.expanded_plugins);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

// Re-exports
pub use config::{ConfigError, ConfigLoader, ConfigResult, SmeltConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::LoggingBuilder;
pub use runtime::{RuntimeBuilder, SmeltRuntime, load_spec};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
