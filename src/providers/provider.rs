//! # Provider capability protocol.
//!
//! [`ParameterProvider`] is the interface every parameter source implements:
//! the telemetry packet processor, the system-variable provider, algorithm
//! and derived-value engines, and any externally registered source. A
//! provider answers capability queries (`can_provide`), resolves identifiers
//! to [`Parameter`] handles, and is switched on and off per parameter as
//! subscriptions come and go.
//!
//! Data flows the other way through [`ParameterListener`]: the provider
//! pushes batches of freshly computed [`ParameterValue`]s into the listener
//! at its own timing, on its own thread. The
//! [`ParameterRouter`](crate::ParameterRouter) is the canonical listener.
//!
//! ## Rules
//! - `start_providing`/`stop_providing` are idempotent: activating an already
//!   active parameter (or deactivating an inactive one) is a no-op.
//! - The listener is invoked synchronously; it returns before the provider
//!   continues. A provider must never push from within a router callback.

use std::sync::Arc;

use crate::error::RoutingError;
use crate::values::{Parameter, ParameterId, ParameterValue};

/// Receiver for batches of freshly produced parameter values.
///
/// One call carries one *delivery*: values that arrived together and should
/// surface together downstream.
pub trait ParameterListener: Send + Sync {
    /// Accepts one delivery. Runs synchronously on the provider's thread.
    fn update(&self, batch: Vec<ParameterValue>);
}

/// A source capable of supplying values for a subset of parameters.
pub trait ParameterProvider: Send + Sync {
    /// True if this provider can supply the identified parameter.
    fn can_provide(&self, id: &ParameterId) -> bool;

    /// Resolves an identifier to a parameter handle.
    ///
    /// # Errors
    /// [`RoutingError::InvalidIdentification`] if the identifier is unknown
    /// to this provider.
    fn get_parameter(&self, id: &ParameterId) -> Result<Parameter, RoutingError>;

    /// Starts supplying values for `parameter`. Idempotent.
    fn start_providing(&self, parameter: &Parameter);

    /// Stops supplying values for `parameter`. Idempotent.
    fn stop_providing(&self, parameter: &Parameter);

    /// Switches the provider to broadcast mode: all parameters it knows about
    /// are supplied regardless of individual `start_providing` calls.
    fn start_providing_all(&self);

    /// Installs the listener the provider will push deliveries into.
    fn set_listener(&self, listener: Arc<dyn ParameterListener>);
}
