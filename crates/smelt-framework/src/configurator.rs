//! Service configuration entry point.

use std::sync::Arc;

use chrono::Utc;
use smelt_core::{
    CapabilityLookup, IdentityStore, ResolveError, ResolveResult, ResolvedService,
    ServiceContext, ServiceSpec,
};
use tracing::{debug, error, info, info_span};

use crate::fingerprint::{FingerprintOptions, fingerprint};
use crate::identity::IdentityManager;
use crate::pipeline::{apply_config, build_cache};
use crate::resolver::{DEFAULT_BASE_PLUGIN, DependencyResolver};

/// Resolves a [`ServiceSpec`] into a [`ResolvedService`].
///
/// Steps, each short-circuiting on error:
///
/// 1. Reject id or class changes against the previous service.
/// 2. Resolve the uuid.
/// 3. Default the plugin list from the previous service.
/// 4. Stamp the resolution time.
/// 5. Expand the dependency graph, seeded with the class then the plugins.
/// 6. Run the configuration pipeline.
/// 7. Fingerprint the result.
/// 8. Run the cache pipeline.
///
/// No partially resolved service is ever returned.
pub struct ServiceConfigurator {
    lookup: Arc<dyn CapabilityLookup>,
    store: Arc<dyn IdentityStore>,
    base_plugin: String,
    fingerprint: FingerprintOptions,
}

impl ServiceConfigurator {
    pub fn new(lookup: Arc<dyn CapabilityLookup>, store: Arc<dyn IdentityStore>) -> Self {
        Self {
            lookup,
            store,
            base_plugin: DEFAULT_BASE_PLUGIN.to_string(),
            fingerprint: FingerprintOptions::default(),
        }
    }

    /// Sets the plugin every service implicitly depends on.
    pub fn base_plugin(mut self, name: impl Into<String>) -> Self {
        self.base_plugin = name.into();
        self
    }

    /// Sets which optional fields participate in the fingerprint.
    pub fn fingerprint_options(mut self, options: FingerprintOptions) -> Self {
        self.fingerprint = options;
        self
    }

    /// Returns the capability lookup in use.
    pub fn lookup(&self) -> &Arc<dyn CapabilityLookup> {
        &self.lookup
    }

    /// Resolves `spec`, optionally as a reconfiguration of `previous`.
    pub fn config(
        &self,
        spec: ServiceSpec,
        previous: Option<&ResolvedService>,
    ) -> ResolveResult<ResolvedService> {
        let span = info_span!("service_config", service_id = %spec.id);
        let _guard = span.enter();

        self.try_config(spec, previous).inspect_err(|e| {
            error!(code = e.code(), error = %e, "Service configuration failed");
        })
    }

    fn try_config(
        &self,
        spec: ServiceSpec,
        previous: Option<&ResolvedService>,
    ) -> ResolveResult<ResolvedService> {
        if let Some(prev) = previous {
            if prev.id != spec.id {
                return Err(ResolveError::IdCannotBeUpdated {
                    previous: prev.id.clone(),
                    requested: spec.id,
                });
            }
            if prev.class != spec.class {
                return Err(ResolveError::ClassCannotBeUpdated {
                    previous: prev.class.clone(),
                    requested: spec.class,
                });
            }
        }

        let uuid = IdentityManager::new(self.store.as_ref()).resolve(&spec, previous)?;

        let plugins = match (&spec.plugins, previous) {
            (Some(plugins), _) => plugins.clone(),
            (None, Some(prev)) => prev.plugins.clone(),
            (None, None) => Vec::new(),
        };

        let mut context = ServiceContext::new(
            spec.id.clone(),
            spec.class.clone(),
            uuid,
            Utc::now(),
            plugins.clone(),
        );

        let seed: Vec<String> = std::iter::once(spec.class.clone())
            .chain(plugins.iter().cloned())
            .collect();
        let expanded = DependencyResolver::new(self.lookup.as_ref(), &self.base_plugin)
            .expand(&spec.class, &seed)?;
        context.expanded_plugins = expanded.clone();

        let config = apply_config(self.lookup.as_ref(), &expanded, spec.config, &context)?;

        let mut service = ResolvedService {
            id: spec.id,
            class: spec.class,
            uuid,
            plugins,
            config,
            timestamp: context.timestamp,
            expanded_plugins: expanded,
            hash: String::new(),
            config_cache: Default::default(),
        };
        service.hash = fingerprint(&service, self.fingerprint)
            .map_err(|e| ResolveError::Fingerprint(e.to_string()))?;
        debug!(hash = %service.hash, "Service fingerprinted");

        context.hash = Some(service.hash.clone());
        service.config_cache = build_cache(
            self.lookup.as_ref(),
            &service.expanded_plugins,
            &service.config,
            &context,
        )?;

        info!(
            uuid = %service.uuid,
            plugins = service.expanded_plugins.len(),
            changed = previous.is_none_or(|prev| !prev.is_same_config(&service)),
            "Service configured"
        );
        Ok(service)
    }
}
