//! # Parameter providers: the capability protocol and the priority chain.
//!
//! - [`ParameterProvider`] — interface every parameter source implements.
//! - [`ParameterListener`] — the push side: providers deliver batches into it.
//! - `ProviderSet` (crate-internal) — registration-ordered resolution chain.

mod provider;
mod set;

pub use provider::{ParameterListener, ParameterProvider};

pub(crate) use set::{ProviderSet, ResolvedItem};
