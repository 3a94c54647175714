//! # Priority-ordered provider chain.
//!
//! [`ProviderSet`] holds every registered [`ParameterProvider`] in a fixed
//! order and resolves identifiers against it. The order is a deliberate,
//! documented policy, not an accident: the telemetry/packet processor is
//! registered first, then the system-variable provider, then the algorithm
//! engine, then the derived-value engine, then any externally registered
//! providers in registration order. The **first** provider reporting
//! `can_provide == true` owns an identifier; later providers are never
//! consulted for it.
//!
//! Batch resolution is all-or-nothing: every identifier is checked before
//! anything else happens, and a failure reports the **complete** list of
//! unresolved identifiers, never just the first one.

use std::sync::Arc;

use tracing::debug;

use crate::error::RoutingError;
use crate::providers::provider::ParameterProvider;
use crate::values::{Parameter, ParameterId};

/// Outcome of resolving one external identifier.
#[derive(Clone, Debug)]
pub(crate) struct ResolvedItem {
    /// The identifier as the caller supplied it.
    pub id: ParameterId,
    /// The resolved parameter handle.
    pub parameter: Parameter,
    /// Index of the owning provider within the set.
    pub provider: usize,
}

/// Registration-ordered collection of parameter providers.
pub(crate) struct ProviderSet {
    providers: Vec<Arc<dyn ParameterProvider>>,
}

impl ProviderSet {
    pub(crate) fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Appends a provider at the end of the priority chain.
    pub(crate) fn add(&mut self, provider: Arc<dyn ParameterProvider>) {
        debug!(position = self.providers.len(), "adding parameter provider");
        self.providers.push(provider);
    }

    pub(crate) fn get(&self, index: usize) -> &Arc<dyn ParameterProvider> {
        &self.providers[index]
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<dyn ParameterProvider>> {
        self.providers.iter()
    }

    /// Resolves a single identifier through the chain.
    ///
    /// # Errors
    /// [`RoutingError::InvalidIdentification`] carrying `id` if no provider
    /// can supply it.
    pub(crate) fn resolve_one(&self, id: &ParameterId) -> Result<ResolvedItem, RoutingError> {
        for (index, provider) in self.providers.iter().enumerate() {
            if provider.can_provide(id) {
                let parameter = provider.get_parameter(id)?;
                return Ok(ResolvedItem {
                    id: id.clone(),
                    parameter,
                    provider: index,
                });
            }
        }
        Err(RoutingError::InvalidIdentification {
            ids: vec![id.clone()],
        })
    }

    /// Resolves a batch of identifiers, collecting every failure.
    ///
    /// # Errors
    /// [`RoutingError::InvalidIdentification`] with the complete unresolved
    /// list if any identifier cannot be matched. No side effects occur in
    /// that case.
    pub(crate) fn resolve(&self, ids: &[ParameterId]) -> Result<Vec<ResolvedItem>, RoutingError> {
        let mut resolved = Vec::with_capacity(ids.len());
        let mut invalid = Vec::new();
        for id in ids {
            match self.resolve_one(id) {
                Ok(item) => resolved.push(item),
                Err(e) => match e {
                    RoutingError::InvalidIdentification { ids } => invalid.extend(ids),
                    other => return Err(other),
                },
            }
        }
        if invalid.is_empty() {
            Ok(resolved)
        } else {
            Err(RoutingError::InvalidIdentification { ids: invalid })
        }
    }
}
