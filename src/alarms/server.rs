//! # Per-parameter alarm state machine.
//!
//! [`AlarmServer`] tracks, for each parameter, whether it is currently in an
//! alarm condition, with hysteresis and latching:
//!
//! ```text
//!                 out-of-limits ×min_violations
//!        NONE ───────────────────────────────────► ACTIVE(unacked)
//!          ▲                                            │
//!          │ in-limits                      acknowledge │
//!          │ + acked/auto-ack                           ▼
//!          └──────────────────────────────────── ACTIVE(acked)
//! ```
//!
//! ## Rules
//! - **Hysteresis**: an alarm is only *reported* (Triggered) once
//!   `min_violations` consecutive out-of-limits samples accumulated; a
//!   return to limits before that discards the alarm silently (glitch).
//! - **Latching**: a reported alarm survives the value returning in limits
//!   until it is acknowledged (or auto-acknowledges); those in-limits samples
//!   emit Updated, not Cleared.
//! - **Severity**: the most-severe snapshot only ever moves up, compared by
//!   the explicit [`MonitoringResult::rank`](crate::MonitoringResult::rank)
//!   table; each strict increase emits SeverityIncreased exactly once.
//! - Listener callbacks run synchronously inside the locked region; calling
//!   back into the server from a listener on the same thread fails fast.
//!
//! The server is driven by the processor-level caller (typically right after
//! limit checking), not by the router.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::alarms::active::ActiveAlarm;
use crate::alarms::event::AlarmEventKind;
use crate::alarms::listener::AlarmListener;
use crate::sync::DispatchGuard;
use crate::values::{Parameter, ParameterValue};

/// Per-parameter alarm lifecycle tracker; see the module docs.
pub struct AlarmServer {
    listener: Arc<dyn AlarmListener>,
    next_id: AtomicU32,
    active: Mutex<HashMap<Parameter, ActiveAlarm>>,
}

impl AlarmServer {
    /// Creates a server notifying `listener` on every transition.
    #[must_use]
    pub fn new(listener: Arc<dyn AlarmListener>) -> Self {
        Self {
            listener,
            next_id: AtomicU32::new(0),
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Feeds one checked sample into the state machine.
    ///
    /// `min_violations` is the hysteresis threshold applicable to this
    /// parameter's alarm definition; `auto_ack` whether the alarm clears on
    /// return-to-normal without operator acknowledgment. Both follow the
    /// currently applicable definition and are re-read on every call.
    ///
    /// # Panics
    /// Panics on reentrant dispatch from within a listener callback.
    pub fn update(&self, value: &ParameterValue, min_violations: u32, auto_ack: bool) {
        let _guard = self.enter("AlarmServer::update");
        let mut active = self.active.lock();
        if value.is_out_of_limits() {
            self.update_out_of_limits(&mut active, value, min_violations, auto_ack);
        } else {
            self.update_in_limits(&mut active, value, min_violations, auto_ack);
        }
    }

    fn update_out_of_limits(
        &self,
        active: &mut HashMap<Parameter, ActiveAlarm>,
        value: &ParameterValue,
        min_violations: u32,
        auto_ack: bool,
    ) {
        let alarm = match active.entry(value.parameter.clone()) {
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
                debug!(parameter = %value.parameter, alarm = id, "new active alarm");
                let alarm = slot.insert(ActiveAlarm::new(id, value.clone(), auto_ack));
                // The counter starts at 1, so a threshold of 0 or 1 reports
                // immediately.
                if min_violations <= 1 {
                    self.listener.on_alarm(AlarmEventKind::Triggered, alarm);
                }
                return;
            }
            Entry::Occupied(slot) => slot.into_mut(),
        };

        alarm.violations += 1;
        alarm.current_value = value.clone();
        alarm.auto_acknowledge = auto_ack;
        let severity_increased =
            value.severity_rank() > alarm.most_severe_value.severity_rank();
        if severity_increased {
            alarm.most_severe_value = value.clone();
        }

        if alarm.violations == min_violations {
            self.listener.on_alarm(AlarmEventKind::Triggered, alarm);
        } else if alarm.violations > min_violations {
            if severity_increased {
                self.listener
                    .on_alarm(AlarmEventKind::SeverityIncreased, alarm);
            } else {
                self.listener.on_alarm(AlarmEventKind::Updated, alarm);
            }
        }
        // Below the threshold nothing is reported yet.
    }

    fn update_in_limits(
        &self,
        active: &mut HashMap<Parameter, ActiveAlarm>,
        value: &ParameterValue,
        min_violations: u32,
        auto_ack: bool,
    ) {
        let parameter = &value.parameter;
        let Some(alarm) = active.get_mut(parameter) else {
            return;
        };

        if alarm.violations < min_violations {
            // Glitch: never reported, so it vanishes without an event.
            debug!(parameter = %parameter, alarm = alarm.id, "discarding unreported alarm");
            active.remove(parameter);
            return;
        }

        alarm.current_value = value.clone();
        alarm.auto_acknowledge = auto_ack;
        if alarm.acknowledged || alarm.auto_acknowledge {
            self.listener.on_alarm(AlarmEventKind::Cleared, alarm);
            active.remove(parameter);
        } else {
            // Latched: stays active until acknowledged.
            self.listener.on_alarm(AlarmEventKind::Updated, alarm);
        }
    }

    /// Acknowledges the alarm identified by `(parameter, alarm_id)`.
    ///
    /// A mismatched id is a benign race (the alarm re-triggered between the
    /// operator's view and the action): it is logged and ignored, and false
    /// is returned. On a match the alarm records the user and, if the value
    /// is already back in limits, clears immediately.
    pub fn acknowledge(&self, parameter: &Parameter, alarm_id: u32, user: &str) -> bool {
        let _guard = self.enter("AlarmServer::acknowledge");
        let mut active = self.active.lock();
        let Some(alarm) = active.get_mut(parameter) else {
            warn!(parameter = %parameter, alarm = alarm_id, "acknowledgment for parameter without active alarm");
            return false;
        };
        if alarm.id != alarm_id {
            warn!(
                parameter = %parameter,
                acknowledged = alarm_id,
                current = alarm.id,
                "stale alarm acknowledgment ignored"
            );
            return false;
        }

        alarm.acknowledged = true;
        alarm.acknowledged_by = Some(user.to_string());
        debug!(parameter = %parameter, alarm = alarm_id, user, "alarm acknowledged");
        if !alarm.current_value.is_out_of_limits() {
            self.listener.on_alarm(AlarmEventKind::Cleared, alarm);
            active.remove(parameter);
        }
        true
    }

    /// Snapshot of the alarm currently active for `parameter`, if any.
    ///
    /// # Panics
    /// Panics when called from within a listener callback of this server:
    /// the accessors share the alarm lock with the dispatch paths, so a
    /// callback snapshotting state would self-deadlock. Copy what you need
    /// from the `&ActiveAlarm` the callback already receives.
    #[must_use]
    pub fn active_alarm(&self, parameter: &Parameter) -> Option<ActiveAlarm> {
        let _guard = self.enter("AlarmServer::active_alarm");
        self.active.lock().get(parameter).cloned()
    }

    /// Snapshots of every currently active alarm.
    ///
    /// # Panics
    /// Panics on reentrant use from a listener callback, like
    /// [`AlarmServer::active_alarm`].
    #[must_use]
    pub fn active_alarms(&self) -> Vec<ActiveAlarm> {
        let _guard = self.enter("AlarmServer::active_alarms");
        self.active.lock().values().cloned().collect()
    }

    /// Number of currently active alarms.
    ///
    /// # Panics
    /// Panics on reentrant use from a listener callback, like
    /// [`AlarmServer::active_alarm`].
    #[must_use]
    pub fn active_count(&self) -> usize {
        let _guard = self.enter("AlarmServer::active_count");
        self.active.lock().len()
    }

    fn enter(&self, what: &'static str) -> DispatchGuard {
        DispatchGuard::enter(self as *const Self as *const (), what)
    }
}
