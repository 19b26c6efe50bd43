//! Configuration and cache pipelines.
//!
//! Both are folds over the dependency-first plugin list produced by the
//! resolver. An entry equal to the service's own id is a placeholder and is
//! never hooked; the entry equal to the service class is hooked through the
//! class callback module.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use smelt_core::{
    CapabilityLookup, Config, ConfigOutcome, PluginModule, ResolveError, ResolveResult,
    ServiceContext,
};
use tracing::debug;

fn module_for(
    lookup: &dyn CapabilityLookup,
    plugin: &str,
    service: &ServiceContext,
) -> Option<Arc<dyn PluginModule>> {
    if plugin == service.class {
        lookup.find_callback_module(plugin)
    } else {
        lookup.find_plugin_module(plugin)
    }
}

/// Runs every configuration hook in order, threading the configuration.
///
/// A hook returning [`ConfigOutcome::Replace`] changes the configuration
/// seen by every later plugin. The first hook error aborts the fold with
/// [`ResolveError::ServiceConfig`].
pub fn apply_config(
    lookup: &dyn CapabilityLookup,
    ordered: &[String],
    initial: Config,
    service: &ServiceContext,
) -> ResolveResult<Config> {
    ordered
        .iter()
        .filter(|plugin| **plugin != service.id)
        .try_fold(initial, |config, plugin| {
            let Some(module) = module_for(lookup, plugin, service) else {
                return Ok(config);
            };
            let outcome = module.config(plugin, &config, service).map_err(|reason| {
                ResolveError::ServiceConfig {
                    plugin: plugin.clone(),
                    reason,
                }
            })?;
            match outcome {
                ConfigOutcome::Unchanged => {
                    debug!(service_id = %service.id, plugin = %plugin, "Config hook: unchanged");
                    Ok(config)
                }
                ConfigOutcome::Replace(next) => {
                    debug!(service_id = %service.id, plugin = %plugin, keys = next.len(), "Config hook: replaced");
                    Ok(next)
                }
            }
        })
}

/// Collects every cache hook's value against the finalized configuration.
///
/// Hooks returning `None` add no entry. A hook error is fatal and maps to
/// [`ResolveError::CacheBuild`].
pub fn build_cache(
    lookup: &dyn CapabilityLookup,
    ordered: &[String],
    config: &Config,
    service: &ServiceContext,
) -> ResolveResult<BTreeMap<String, Value>> {
    ordered
        .iter()
        .filter(|plugin| **plugin != service.id)
        .try_fold(BTreeMap::new(), |mut cache, plugin| {
            let Some(module) = module_for(lookup, plugin, service) else {
                return Ok(cache);
            };
            let value = module
                .cache(plugin, config, service)
                .map_err(|reason| ResolveError::CacheBuild {
                    plugin: plugin.clone(),
                    reason,
                })?;
            if let Some(value) = value {
                debug!(service_id = %service.id, plugin = %plugin, "Cache entry built");
                cache.insert(plugin.clone(), value);
            }
            Ok(cache)
        })
}
