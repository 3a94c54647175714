//! # Alarm transition events.
//!
//! [`AlarmEventKind`] classifies every transition the
//! [`AlarmServer`](crate::AlarmServer) notifies. The four-kind contract is
//! what external sinks build on: a persistence layer serializes them into
//! durable storage, a notification producer maps them onto info/warning/error
//! buckets (return-to-normal → info, watch/warning ranks → warning, higher
//! ranks → error). That mapping is the sink's policy; the events only have to
//! make it derivable, via the alarm's monitoring-result ranks.

/// Classification of alarm state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmEventKind {
    /// The violation counter reached `min_violations`: the alarm is now
    /// reported.
    Triggered,

    /// The alarm changed without triggering or clearing: a further
    /// out-of-limits sample at unchanged severity, or an in-limits sample on
    /// a latched (unacknowledged) alarm.
    Updated,

    /// The most-severe snapshot was replaced by a strictly higher-ranked
    /// sample.
    SeverityIncreased,

    /// The alarm ended: value back in limits and acknowledged (or
    /// auto-acknowledging). The alarm record is removed with this event.
    Cleared,
}

impl AlarmEventKind {
    /// Short stable label (snake_case) for use in logs/metrics.
    #[must_use]
    pub fn as_label(self) -> &'static str {
        match self {
            AlarmEventKind::Triggered => "alarm_triggered",
            AlarmEventKind::Updated => "alarm_updated",
            AlarmEventKind::SeverityIncreased => "alarm_severity_increased",
            AlarmEventKind::Cleared => "alarm_cleared",
        }
    }
}
