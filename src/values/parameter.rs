//! # Parameter identity.
//!
//! A [`Parameter`] is the identity of a named telemetry or derived data point:
//! a qualified name plus a set of namespace-scoped aliases. Definitions are
//! owned by the mission database; everything in this crate only holds handles.
//!
//! ## Identity rules
//! - Two [`Parameter`] handles are the **same entity** iff they point at the
//!   same definition allocation (`Arc` pointer identity). Name equality is not
//!   sufficient: a name may be ambiguous across namespaces.
//! - Handles are cheap to clone and immutable once built.
//!
//! External callers identify parameters by a [`ParameterId`] — a
//! `(namespace, name)` pair resolved through the provider chain.
//!
//! ## Example
//! ```rust
//! use paramflow::{Parameter, ParameterId};
//!
//! let p = Parameter::new("/SAT1/POWER/BusVoltage")
//!     .with_alias("MDB:OPS Name", "BUS_VOLT");
//!
//! assert_eq!(p.qualified_name(), "/SAT1/POWER/BusVoltage");
//! assert_eq!(p.alias("MDB:OPS Name"), Some("BUS_VOLT"));
//! assert_eq!(p.alias_or_name("MDB:Pathname"), "/SAT1/POWER/BusVoltage");
//!
//! // Same definition, same entity; equal names are not enough.
//! let q = p.clone();
//! assert_eq!(p, q);
//! assert_ne!(p, Parameter::new("/SAT1/POWER/BusVoltage"));
//!
//! let id = ParameterId::qualified("/SAT1/POWER/BusVoltage");
//! assert_eq!(id.to_string(), "/SAT1/POWER/BusVoltage");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// External identifier for a parameter: an optional namespace plus a name.
///
/// Callers outside the processor identify parameters by this pair; the
/// provider chain resolves it to a [`Parameter`] handle. A missing namespace
/// means the name is a fully qualified one.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ParameterId {
    /// Namespace the name is scoped to, if any.
    pub namespace: Option<String>,
    /// Parameter name within the namespace (or the qualified name).
    pub name: String,
}

impl ParameterId {
    /// Creates an id scoped to a namespace.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }

    /// Creates an id from a fully qualified name (no namespace).
    pub fn qualified(name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
        }
    }
}

impl fmt::Display for ParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{ns}/{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Immutable parameter definition data.
#[derive(Debug)]
struct ParameterDef {
    qualified_name: String,
    aliases: HashMap<String, String>,
}

/// Handle to a parameter definition.
///
/// Cheap to clone; equality and hashing are by definition identity, not by
/// name. Build with [`Parameter::new`] and [`Parameter::with_alias`].
#[derive(Clone, Debug)]
pub struct Parameter(Arc<ParameterDef>);

impl Parameter {
    /// Creates a new definition with the given qualified name.
    #[must_use]
    pub fn new(qualified_name: impl Into<String>) -> Self {
        Self(Arc::new(ParameterDef {
            qualified_name: qualified_name.into(),
            aliases: HashMap::new(),
        }))
    }

    /// Returns a copy of this definition with an additional namespace alias.
    ///
    /// Only meaningful while building the definition: the returned handle is a
    /// **new** entity, distinct from `self`.
    #[must_use]
    pub fn with_alias(&self, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        let mut aliases = self.0.aliases.clone();
        aliases.insert(namespace.into(), name.into());
        Self(Arc::new(ParameterDef {
            qualified_name: self.0.qualified_name.clone(),
            aliases,
        }))
    }

    /// The fully qualified name of this parameter.
    #[must_use]
    pub fn qualified_name(&self) -> &str {
        &self.0.qualified_name
    }

    /// The alias of this parameter in `namespace`, if one is defined.
    #[must_use]
    pub fn alias(&self, namespace: &str) -> Option<&str> {
        self.0.aliases.get(namespace).map(String::as_str)
    }

    /// The alias in `namespace`, falling back to the qualified name.
    ///
    /// This is the tagging rule for broadcast subscriptions.
    #[must_use]
    pub fn alias_or_name(&self, namespace: &str) -> &str {
        self.alias(namespace).unwrap_or(self.qualified_name())
    }

    /// True if `id` names this parameter: a qualified id must match the
    /// qualified name, a namespaced id must match the alias in that namespace.
    #[must_use]
    pub fn matches(&self, id: &ParameterId) -> bool {
        match &id.namespace {
            None => self.qualified_name() == id.name,
            Some(ns) => self.alias(ns) == Some(id.name.as_str()),
        }
    }
}

impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Parameter {}

impl Hash for Parameter {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.qualified_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_by_definition_not_by_name() {
        let a = Parameter::new("/SAT1/T1");
        let b = Parameter::new("/SAT1/T1");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_alias_lookup_and_fallback() {
        let p = Parameter::new("/SAT1/T1").with_alias("OPS", "TEMP_1");
        assert_eq!(p.alias("OPS"), Some("TEMP_1"));
        assert_eq!(p.alias("TLM"), None);
        assert_eq!(p.alias_or_name("OPS"), "TEMP_1");
        assert_eq!(p.alias_or_name("TLM"), "/SAT1/T1");
    }

    #[test]
    fn test_matches_qualified_and_namespaced_ids() {
        let p = Parameter::new("/SAT1/T1").with_alias("OPS", "TEMP_1");
        assert!(p.matches(&ParameterId::qualified("/SAT1/T1")));
        assert!(p.matches(&ParameterId::new("OPS", "TEMP_1")));
        assert!(!p.matches(&ParameterId::new("OPS", "/SAT1/T1")));
        assert!(!p.matches(&ParameterId::qualified("TEMP_1")));
    }

    #[test]
    fn test_display() {
        assert_eq!(ParameterId::new("OPS", "TEMP_1").to_string(), "OPS/TEMP_1");
        assert_eq!(ParameterId::qualified("/SAT1/T1").to_string(), "/SAT1/T1");
    }
}
