//! # Value types: parameter identities and timestamped samples.
//!
//! - [`Parameter`] / [`ParameterId`] — identity of a data point and the
//!   external `(namespace, name)` form used to resolve it.
//! - [`Value`] — typed union for raw/engineering representations.
//! - [`ParameterValue`] — one immutable sample with acquisition metadata.
//! - [`MonitoringResult`] — ordered limit classification with an explicit
//!   severity rank table.

mod monitoring;
mod parameter;
mod pvalue;
mod value;

pub use monitoring::MonitoringResult;
pub use parameter::{Parameter, ParameterId};
pub use pvalue::{AcquisitionStatus, FloatRange, ParameterValue};
pub use value::Value;
