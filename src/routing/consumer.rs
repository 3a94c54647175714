//! # Consumer callbacks and delivered values.
//!
//! [`ParameterConsumer`] is the extension point for anything that wants
//! parameter updates: displays, archive fillers, alarm checkers, downlink
//! bridges. The router invokes a consumer **at most once per update cycle**,
//! with every matching value of that cycle merged into one call.
//!
//! [`DerivedValueConsumer`] is the priority variant used by algorithm and
//! derived-value engines: it is invoked *during* the cycle and its results
//! merge back into the same delivery (one pass only).

use crate::routing::subscription::SubscriptionId;
use crate::values::{ParameterId, ParameterValue};

/// One delivered value, tagged with the identifier it was requested under.
///
/// For explicit subscriptions the tag is the external id used in the request;
/// for broadcast subscriptions it is the alias in the requested namespace
/// (falling back to the qualified name).
#[derive(Clone, Debug)]
pub struct IdentifiedValue {
    /// The identifier this value is delivered under.
    pub id: ParameterId,
    /// The sample itself.
    pub value: ParameterValue,
}

/// Receiver of routed parameter updates.
///
/// ## Rules
/// - Called at most once per `update()` cycle, with all matching values.
/// - Runs synchronously on the provider's thread, inside the router's lock:
///   keep it short, and never call back into the router from it (reentrant
///   dispatch is a contract violation and fails fast).
pub trait ParameterConsumer: Send + Sync {
    /// Delivers the values accumulated for `subscription` in this cycle, in
    /// batch arrival order.
    fn update_items(&self, subscription: SubscriptionId, items: &[IdentifiedValue]);
}

/// Priority consumer that computes dependent values within the update cycle.
///
/// When a delivery touches a derived-value subscription, the router invokes
/// `update_derived` immediately and merges the returned values into the same
/// cycle's accumulation. Results are **not** re-fed into a further derived
/// pass: a second-order derivation (a derived value depending on another
/// derived value of the same cycle) resolves one cycle later.
pub trait DerivedValueConsumer: Send + Sync {
    /// Recomputes dependent values from the matched inputs.
    ///
    /// # Errors
    /// A failing recompute is logged by the router and skipped; it never
    /// prevents delivery of the rest of the batch to unrelated consumers.
    fn update_derived(
        &self,
        subscription: SubscriptionId,
        items: &[IdentifiedValue],
    ) -> Result<Vec<ParameterValue>, String>;
}
