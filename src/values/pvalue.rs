//! # Parameter value snapshots.
//!
//! A [`ParameterValue`] is one timestamped sample of a [`Parameter`]: raw and
//! engineering representations, acquisition metadata and the monitoring
//! result attached by limit checking. Snapshots are immutable after
//! construction; the router never rewrites them, it only moves them around.
//!
//! Construction follows the builder idiom:
//!
//! ```rust
//! use paramflow::{AcquisitionStatus, MonitoringResult, Parameter, ParameterValue, Value};
//!
//! let volt = Parameter::new("/SAT1/POWER/BusVoltage");
//! let pv = ParameterValue::new(volt.clone())
//!     .with_raw_value(Value::Uint32(812))
//!     .with_eng_value(Value::Double(28.4))
//!     .with_generation_time(1_000)
//!     .with_acquisition_time(1_007)
//!     .with_monitoring_result(MonitoringResult::InLimits);
//!
//! assert_eq!(pv.parameter, volt);
//! assert_eq!(pv.acquisition_status, AcquisitionStatus::Acquired);
//! assert!(!pv.is_out_of_limits());
//! ```

use crate::values::monitoring::MonitoringResult;
use crate::values::parameter::Parameter;
use crate::values::value::Value;

/// How a sample was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcquisitionStatus {
    /// Normally received and decoded.
    Acquired,
    /// Expected but never received.
    NotReceived,
    /// Received but failed validity checks.
    Invalid,
    /// Received, but older than the configured freshness window.
    Expired,
}

/// Closed floating-point interval used for warning/critical bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FloatRange {
    /// Inclusive lower bound.
    pub min_inclusive: f64,
    /// Inclusive upper bound.
    pub max_inclusive: f64,
}

impl FloatRange {
    /// Creates a new inclusive range.
    #[must_use]
    pub fn new(min_inclusive: f64, max_inclusive: f64) -> Self {
        Self {
            min_inclusive,
            max_inclusive,
        }
    }

    /// True if `v` lies within the range.
    #[must_use]
    pub fn contains(&self, v: f64) -> bool {
        v >= self.min_inclusive && v <= self.max_inclusive
    }
}

/// One timestamped sample of a parameter.
///
/// Fields are public and read-only by convention: a value is built once by its
/// provider and then shared. Times are milliseconds since the mission epoch.
#[derive(Clone, Debug)]
pub struct ParameterValue {
    /// The parameter this sample belongs to.
    pub parameter: Parameter,
    /// Raw (uncalibrated) value, if any.
    pub raw_value: Option<Value>,
    /// Engineering (calibrated) value, if any.
    pub eng_value: Option<Value>,
    /// When the sample was acquired on the ground.
    pub acquisition_time: i64,
    /// When the sample was generated on board.
    pub generation_time: i64,
    /// How the sample was obtained.
    pub acquisition_status: AcquisitionStatus,
    /// True while the value is still being processed (e.g. pending calibration).
    pub processing_status: bool,
    /// Limit classification attached by alarm checking, if performed.
    pub monitoring_result: Option<MonitoringResult>,
    /// Warning bounds applicable at generation time, if any.
    pub warning_range: Option<FloatRange>,
    /// Critical bounds applicable at generation time, if any.
    pub critical_range: Option<FloatRange>,
}

impl ParameterValue {
    /// Creates a new sample with no values and `Acquired` status.
    #[must_use]
    pub fn new(parameter: Parameter) -> Self {
        Self {
            parameter,
            raw_value: None,
            eng_value: None,
            acquisition_time: 0,
            generation_time: 0,
            acquisition_status: AcquisitionStatus::Acquired,
            processing_status: false,
            monitoring_result: None,
            warning_range: None,
            critical_range: None,
        }
    }

    /// Sets the raw value.
    #[must_use]
    pub fn with_raw_value(mut self, v: Value) -> Self {
        self.raw_value = Some(v);
        self
    }

    /// Sets the engineering value.
    #[must_use]
    pub fn with_eng_value(mut self, v: Value) -> Self {
        self.eng_value = Some(v);
        self
    }

    /// Sets the acquisition time (ms since mission epoch).
    #[must_use]
    pub fn with_acquisition_time(mut self, t: i64) -> Self {
        self.acquisition_time = t;
        self
    }

    /// Sets the generation time (ms since mission epoch).
    #[must_use]
    pub fn with_generation_time(mut self, t: i64) -> Self {
        self.generation_time = t;
        self
    }

    /// Sets the acquisition status.
    #[must_use]
    pub fn with_acquisition_status(mut self, s: AcquisitionStatus) -> Self {
        self.acquisition_status = s;
        self
    }

    /// Marks the value as still being processed.
    #[must_use]
    pub fn with_processing_status(mut self, p: bool) -> Self {
        self.processing_status = p;
        self
    }

    /// Sets the monitoring result.
    #[must_use]
    pub fn with_monitoring_result(mut self, mr: MonitoringResult) -> Self {
        self.monitoring_result = Some(mr);
        self
    }

    /// Sets the applicable warning bounds.
    #[must_use]
    pub fn with_warning_range(mut self, r: FloatRange) -> Self {
        self.warning_range = Some(r);
        self
    }

    /// Sets the applicable critical bounds.
    #[must_use]
    pub fn with_critical_range(mut self, r: FloatRange) -> Self {
        self.critical_range = Some(r);
        self
    }

    /// The engineering value if present, otherwise the raw value.
    #[must_use]
    pub fn effective_value(&self) -> Option<&Value> {
        self.eng_value.as_ref().or(self.raw_value.as_ref())
    }

    /// True if the attached monitoring result is an alarm condition.
    ///
    /// A sample without a monitoring result is treated as in limits.
    #[must_use]
    pub fn is_out_of_limits(&self) -> bool {
        self.monitoring_result
            .is_some_and(MonitoringResult::is_out_of_limits)
    }

    /// Severity rank of the attached monitoring result (0 if none).
    #[must_use]
    pub fn severity_rank(&self) -> u8 {
        self.monitoring_result.map_or(0, MonitoringResult::rank)
    }
}
