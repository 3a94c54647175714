//! # Simple logging listener for debugging and demos.
//!
//! [`AlarmLogWriter`] prints alarm transitions to stdout in a human-readable
//! format. This is primarily useful for development, debugging, and examples.
//!
//! ## Output format
//! ```text
//! [alarm-triggered] parameter=/SAT1/POWER/BusVoltage id=4 severity=4 violations=3
//! [alarm-severity-increased] parameter=/SAT1/POWER/BusVoltage id=4 severity=5
//! [alarm-updated] parameter=/SAT1/POWER/BusVoltage id=4 violations=7
//! [alarm-cleared] parameter=/SAT1/POWER/BusVoltage id=4 by=operator7
//! ```

use crate::alarms::active::ActiveAlarm;
use crate::alarms::event::AlarmEventKind;
use crate::alarms::listener::AlarmListener;

/// Simple stdout logging listener.
///
/// Enabled via the `logging` feature. Prints human-readable alarm transitions
/// to stdout for debugging and demonstration purposes.
///
/// Not intended for production use - implement a custom [`AlarmListener`] for
/// durable storage or notification delivery.
pub struct AlarmLogWriter;

impl AlarmListener for AlarmLogWriter {
    fn on_alarm(&self, kind: AlarmEventKind, alarm: &ActiveAlarm) {
        let parameter = &alarm.current_value.parameter;
        match kind {
            AlarmEventKind::Triggered => {
                println!(
                    "[alarm-triggered] parameter={parameter} id={} severity={} violations={}",
                    alarm.id,
                    alarm.most_severe_value.severity_rank(),
                    alarm.violations
                );
            }
            AlarmEventKind::SeverityIncreased => {
                println!(
                    "[alarm-severity-increased] parameter={parameter} id={} severity={}",
                    alarm.id,
                    alarm.most_severe_value.severity_rank()
                );
            }
            AlarmEventKind::Updated => {
                println!(
                    "[alarm-updated] parameter={parameter} id={} violations={}",
                    alarm.id, alarm.violations
                );
            }
            AlarmEventKind::Cleared => {
                println!(
                    "[alarm-cleared] parameter={parameter} id={} by={}",
                    alarm.id,
                    alarm.acknowledged_by_or_synthesized()
                );
            }
        }
    }
}
