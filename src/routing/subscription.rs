//! # Subscription bookkeeping types.
//!
//! A subscription is a registered interest tied to one consumer callback:
//! either an explicit item list or a broadcast over a namespace. Ids are
//! handed out by a per-router monotonic counter and never reused while the
//! router is alive.

use std::fmt;

use crate::values::{Parameter, ParameterId};

/// Opaque subscription identifier, unique for the lifetime of its router.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u32);

impl SubscriptionId {
    /// The raw numeric id (for logs and wire protocols).
    #[must_use]
    pub fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One item of an explicit subscription: the external id the caller used and
/// the resolved parameter. The owning provider lives in the router's index.
///
/// Duplicates are allowed by construction; adding the same parameter twice
/// yields two items and two deliveries per cycle.
#[derive(Clone)]
pub(crate) struct SubscriptionItem {
    pub id: ParameterId,
    pub parameter: Parameter,
}

/// What kind of interest a subscription represents.
pub(crate) enum SubscriptionKind {
    /// Explicit item list, grown/shrunk via add/remove items.
    Explicit { items: Vec<SubscriptionItem> },
    /// Broadcast: every value of every delivery, re-tagged per namespace.
    Broadcast { namespace: Option<String> },
}

/// Internal per-subscription record.
pub(crate) struct Subscription {
    pub kind: SubscriptionKind,
}

impl Subscription {
    pub(crate) fn explicit(items: Vec<SubscriptionItem>) -> Self {
        Self {
            kind: SubscriptionKind::Explicit { items },
        }
    }

    pub(crate) fn broadcast(namespace: Option<String>) -> Self {
        Self {
            kind: SubscriptionKind::Broadcast { namespace },
        }
    }
}
