//! # Alarm listener trait.
//!
//! [`AlarmListener`] is the extension point for anything that wants alarm
//! transitions: durable storage fillers, notification producers, UIs.
//!
//! ## Rules
//! - Called synchronously from inside the alarm server's locked region:
//!   keep it short, and never call back into the server from it (reentrant
//!   dispatch fails fast).
//! - The [`ActiveAlarm`] reference is a snapshot view; copy what you need.

use crate::alarms::active::ActiveAlarm;
use crate::alarms::event::AlarmEventKind;

/// Receiver of alarm state transitions.
pub trait AlarmListener: Send + Sync {
    /// Notifies one transition. For [`AlarmEventKind::Cleared`] the record is
    /// already final: it is removed right after this call returns.
    fn on_alarm(&self, kind: AlarmEventKind, alarm: &ActiveAlarm);
}
