//! # Subscription routing: the registry, consumer seams and dispatch.
//!
//! - [`ParameterRouter`] — the central engine: subscriptions in, deliveries
//!   out, one callback per consumer per cycle.
//! - [`ParameterConsumer`] / [`DerivedValueConsumer`] — callback seams.
//! - [`SubscriptionId`] / [`IdentifiedValue`] — what consumers see.

mod consumer;
mod router;
mod subscription;

pub use consumer::{DerivedValueConsumer, IdentifiedValue, ParameterConsumer};
pub use router::ParameterRouter;
pub use subscription::SubscriptionId;
