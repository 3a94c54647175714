//! # Monitoring result classification.
//!
//! [`MonitoringResult`] classifies how far out of limits a sample is. There
//! are two tracks:
//!
//! - **continuous** parameters use the `*Low`/`*High` variants, one pair per
//!   severity level;
//! - **discrete/state** parameters use the flat variants (`Watch`,
//!   `Warning`, ... `Severe`) with no low/high direction.
//!
//! Severity comparison is done through an explicit integer rank table
//! ([`MonitoringResult::rank`]), **not** through declaration order, so that
//! reordering variants can never silently change alarm behavior. Both tracks
//! share the same rank scale:
//!
//! ```text
//! rank 0: InLimits
//! rank 1: Watch, WatchLow, WatchHigh
//! rank 2: Warning, WarningLow, WarningHigh
//! rank 3: Distress, DistressLow, DistressHigh
//! rank 4: Critical, CriticalLow, CriticalHigh
//! rank 5: Severe, SevereLow, SevereHigh
//! ```

/// Ordered classification of a sample against its alarm limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MonitoringResult {
    /// Within all limits.
    InLimits,
    /// Watch level, discrete/state parameters.
    Watch,
    /// Watch level, below the low bound.
    WatchLow,
    /// Watch level, above the high bound.
    WatchHigh,
    /// Warning level, discrete/state parameters.
    Warning,
    /// Warning level, below the low bound.
    WarningLow,
    /// Warning level, above the high bound.
    WarningHigh,
    /// Distress level, discrete/state parameters.
    Distress,
    /// Distress level, below the low bound.
    DistressLow,
    /// Distress level, above the high bound.
    DistressHigh,
    /// Critical level, discrete/state parameters.
    Critical,
    /// Critical level, below the low bound.
    CriticalLow,
    /// Critical level, above the high bound.
    CriticalHigh,
    /// Severe level, discrete/state parameters.
    Severe,
    /// Severe level, below the low bound.
    SevereLow,
    /// Severe level, above the high bound.
    SevereHigh,
}

impl MonitoringResult {
    /// Numeric severity rank. Higher is more severe.
    ///
    /// The table is exhaustive on purpose: adding a variant without assigning
    /// a rank is a compile error.
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            MonitoringResult::InLimits => 0,
            MonitoringResult::Watch | MonitoringResult::WatchLow | MonitoringResult::WatchHigh => 1,
            MonitoringResult::Warning
            | MonitoringResult::WarningLow
            | MonitoringResult::WarningHigh => 2,
            MonitoringResult::Distress
            | MonitoringResult::DistressLow
            | MonitoringResult::DistressHigh => 3,
            MonitoringResult::Critical
            | MonitoringResult::CriticalLow
            | MonitoringResult::CriticalHigh => 4,
            MonitoringResult::Severe
            | MonitoringResult::SevereLow
            | MonitoringResult::SevereHigh => 5,
        }
    }

    /// True if this classification represents an alarm condition.
    #[must_use]
    pub fn is_out_of_limits(self) -> bool {
        self.rank() > 0
    }

    /// True if `self` is strictly more severe than `other`.
    #[must_use]
    pub fn more_severe_than(self, other: MonitoringResult) -> bool {
        self.rank() > other.rank()
    }

    /// Short stable label (snake_case) for use in logs/metrics.
    #[must_use]
    pub fn as_label(self) -> &'static str {
        match self {
            MonitoringResult::InLimits => "in_limits",
            MonitoringResult::Watch => "watch",
            MonitoringResult::WatchLow => "watch_low",
            MonitoringResult::WatchHigh => "watch_high",
            MonitoringResult::Warning => "warning",
            MonitoringResult::WarningLow => "warning_low",
            MonitoringResult::WarningHigh => "warning_high",
            MonitoringResult::Distress => "distress",
            MonitoringResult::DistressLow => "distress_low",
            MonitoringResult::DistressHigh => "distress_high",
            MonitoringResult::Critical => "critical",
            MonitoringResult::CriticalLow => "critical_low",
            MonitoringResult::CriticalHigh => "critical_high",
            MonitoringResult::Severe => "severe",
            MonitoringResult::SevereLow => "severe_low",
            MonitoringResult::SevereHigh => "severe_high",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_continuous_track_ordering() {
        use MonitoringResult::*;
        let ascending = [InLimits, WatchHigh, WarningHigh, DistressHigh, CriticalHigh, SevereHigh];
        for pair in ascending.windows(2) {
            assert!(
                pair[1].more_severe_than(pair[0]),
                "{:?} should outrank {:?}",
                pair[1],
                pair[0]
            );
        }
    }

    #[test]
    fn test_discrete_track_ordering() {
        use MonitoringResult::*;
        let ascending = [Watch, Warning, Distress, Critical, Severe];
        for pair in ascending.windows(2) {
            assert!(pair[1].more_severe_than(pair[0]));
        }
    }

    #[test]
    fn test_low_and_high_share_rank() {
        assert_eq!(
            MonitoringResult::WarningLow.rank(),
            MonitoringResult::WarningHigh.rank()
        );
        assert_eq!(
            MonitoringResult::Warning.rank(),
            MonitoringResult::WarningHigh.rank()
        );
        assert!(!MonitoringResult::WarningLow.more_severe_than(MonitoringResult::WarningHigh));
    }

    #[test]
    fn test_out_of_limits() {
        assert!(!MonitoringResult::InLimits.is_out_of_limits());
        assert!(MonitoringResult::Watch.is_out_of_limits());
        assert!(MonitoringResult::SevereLow.is_out_of_limits());
    }
}
