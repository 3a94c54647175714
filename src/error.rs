//! Error types used by the routing engine.
//!
//! [`RoutingError`] covers the two failure modes of the identification
//! protocol:
//!
//! - [`RoutingError::InvalidIdentification`] — one or more identifiers could
//!   not be matched by any provider; carries the **complete** offending list,
//!   never just the first bad id.
//! - [`RoutingError::InvalidRequestIdentification`] — an operation referenced
//!   a subscription id that does not exist; a protocol error on the caller's
//!   side, not a recoverable condition.
//!
//! Both provide `as_label`/`as_message` helpers for logging/metrics.

use thiserror::Error;

use crate::values::ParameterId;

/// # Errors produced by identification and subscription management.
///
/// Resolution operations guarantee no partial mutation on failure: if any id
/// in a batch is unresolvable, no subscription is created and no provider is
/// activated.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RoutingError {
    /// One or more identifiers were not matched by any provider.
    #[error("invalid identification for {} parameter(s): {ids:?}", ids.len())]
    InvalidIdentification {
        /// The complete list of unresolved identifiers.
        ids: Vec<ParameterId>,
    },

    /// An operation referenced a subscription id that does not exist.
    #[error("no such subscription: {subscription_id}")]
    InvalidRequestIdentification {
        /// The offending subscription id.
        subscription_id: u32,
    },
}

impl RoutingError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use paramflow::{ParameterId, RoutingError};
    ///
    /// let err = RoutingError::InvalidIdentification {
    ///     ids: vec![ParameterId::qualified("/SAT1/Bogus")],
    /// };
    /// assert_eq!(err.as_label(), "invalid_identification");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RoutingError::InvalidIdentification { .. } => "invalid_identification",
            RoutingError::InvalidRequestIdentification { .. } => "invalid_request_identification",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RoutingError::InvalidIdentification { ids } => {
                let names: Vec<String> = ids.iter().map(ToString::to_string).collect();
                format!("unresolved identifiers: {}", names.join(", "))
            }
            RoutingError::InvalidRequestIdentification { subscription_id } => {
                format!("unknown subscription id {subscription_id}")
            }
        }
    }

    /// The unresolved identifiers, if this is an identification failure.
    pub fn invalid_ids(&self) -> Option<&[ParameterId]> {
        match self {
            RoutingError::InvalidIdentification { ids } => Some(ids),
            RoutingError::InvalidRequestIdentification { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        let e = RoutingError::InvalidIdentification { ids: vec![] };
        assert_eq!(e.as_label(), "invalid_identification");
        let e = RoutingError::InvalidRequestIdentification { subscription_id: 7 };
        assert_eq!(e.as_label(), "invalid_request_identification");
    }

    #[test]
    fn test_messages_carry_details() {
        let e = RoutingError::InvalidIdentification {
            ids: vec![
                ParameterId::qualified("/SAT1/A"),
                ParameterId::new("OPS", "B"),
            ],
        };
        assert_eq!(e.as_message(), "unresolved identifiers: /SAT1/A, OPS/B");
        assert_eq!(e.invalid_ids().map(<[_]>::len), Some(2));

        let e = RoutingError::InvalidRequestIdentification { subscription_id: 42 };
        assert_eq!(e.as_message(), "unknown subscription id 42");
        assert!(e.invalid_ids().is_none());
    }
}
