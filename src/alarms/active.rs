//! # Active alarm records.

use crate::values::ParameterValue;

/// Live state of an out-of-limits (or latched) parameter.
///
/// Created when a parameter first goes out of limits; removed when the alarm
/// clears. Listeners receive references during notification and may copy what
/// they need; the record itself is owned by the alarm server.
#[derive(Clone, Debug)]
pub struct ActiveAlarm {
    /// Monotonic alarm id, unique per alarm server. Stale acknowledgments are
    /// detected by comparing against it.
    pub id: u32,
    /// The sample that opened the alarm.
    pub trigger_value: ParameterValue,
    /// The most severe sample seen since the alarm opened.
    pub most_severe_value: ParameterValue,
    /// The latest sample.
    pub current_value: ParameterValue,
    /// Consecutive out-of-limits samples seen. Starts at 1 and never
    /// decreases; only removal of the alarm resets it.
    pub violations: u32,
    /// True once an operator acknowledged the alarm.
    pub acknowledged: bool,
    /// Who acknowledged, when known.
    pub acknowledged_by: Option<String>,
    /// True if the alarm clears on return-to-normal without an operator
    /// acknowledgment.
    pub auto_acknowledge: bool,
}

impl ActiveAlarm {
    pub(crate) fn new(id: u32, value: ParameterValue, auto_acknowledge: bool) -> Self {
        Self {
            id,
            trigger_value: value.clone(),
            most_severe_value: value.clone(),
            current_value: value,
            violations: 1,
            acknowledged: false,
            acknowledged_by: None,
            auto_acknowledge,
        }
    }

    /// The acknowledging user for a Cleared event. When nobody is recorded,
    /// the string is synthesized: `"autoAcknoledged"` on the auto-acknowledge
    /// path (spelling kept from the original ground segment for downstream
    /// compatibility), `"unknown"` otherwise.
    #[must_use]
    pub fn acknowledged_by_or_synthesized(&self) -> &str {
        match &self.acknowledged_by {
            Some(user) => user,
            None if self.auto_acknowledge => "autoAcknoledged",
            None => "unknown",
        }
    }
}
