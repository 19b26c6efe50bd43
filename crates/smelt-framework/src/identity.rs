//! Identity assignment.

use smelt_core::{IdentityStore, ResolveError, ResolveResult, ResolvedService, ServiceSpec, Uuid};
use tracing::{debug, info, warn};

/// Decides the uuid of a service being resolved.
///
/// Resolution order:
///
/// 1. A uuid in the spec must equal the previous service's uuid, if any.
///    With no previous service it is accepted as-is.
/// 2. Otherwise the identity persisted for the service id is reused.
/// 3. Otherwise the previous service's uuid is kept.
/// 4. Otherwise a fresh v4 uuid is generated.
///
/// Cases 3 and 4 persist the result. Store failures are logged and never
/// fail the resolution.
pub struct IdentityManager<'a> {
    store: &'a dyn IdentityStore,
}

impl<'a> IdentityManager<'a> {
    pub fn new(store: &'a dyn IdentityStore) -> Self {
        Self { store }
    }

    /// Returns the uuid for `spec`.
    ///
    /// # Errors
    ///
    /// [`ResolveError::UuidCannotBeUpdated`] if the spec's uuid conflicts with
    /// the previous service's uuid.
    pub fn resolve(
        &self,
        spec: &ServiceSpec,
        previous: Option<&ResolvedService>,
    ) -> ResolveResult<Uuid> {
        if let Some(requested) = spec.uuid {
            return match previous {
                Some(prev) if prev.uuid != requested => Err(ResolveError::UuidCannotBeUpdated {
                    previous: prev.uuid,
                    requested,
                }),
                _ => Ok(requested),
            };
        }

        match self.store.read(&spec.id) {
            Ok(Some(stored)) => {
                debug!(service_id = %spec.id, uuid = %stored, "Reusing persisted identity");
                return Ok(stored);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(service_id = %spec.id, error = %e, "Failed to read persisted identity");
            }
        }

        let uuid = match previous {
            Some(prev) => prev.uuid,
            None => {
                let fresh = Uuid::new_v4();
                info!(service_id = %spec.id, uuid = %fresh, "Generated new service identity");
                fresh
            }
        };

        if let Err(e) = self.store.write(&spec.id, uuid, spec) {
            warn!(service_id = %spec.id, error = %e, "Failed to persist service identity");
        }
        Ok(uuid)
    }
}
