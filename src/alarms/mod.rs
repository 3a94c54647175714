//! # Alarm tracking: per-parameter state machines with hysteresis and latching.
//!
//! - [`AlarmServer`] — the state machine host, one alarm per parameter.
//! - [`AlarmListener`] — the transition callback seam.
//! - [`ActiveAlarm`] / [`AlarmEventKind`] — what listeners see.

mod active;
mod event;
mod listener;
#[cfg(feature = "logging")]
mod log;
mod server;

pub use active::ActiveAlarm;
pub use event::AlarmEventKind;
pub use listener::AlarmListener;
#[cfg(feature = "logging")]
pub use log::AlarmLogWriter;
pub use server::AlarmServer;
