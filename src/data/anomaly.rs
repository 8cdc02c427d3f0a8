//! Latency spike classification.
//!
//! A spike is a latency sample exceeding a configurable multiple of the
//! immediately preceding comparable sample for the same host. The flag is
//! a pure function of the `(previous, current)` pair; it is recomputed on
//! demand and never stored, so it can never go stale.

use super::sample::Sample;

/// Default spike threshold: current latency above 1.5x the previous.
pub const DEFAULT_SPIKE_RATIO: f64 = 1.5;

/// Per-host probing state, derived from the last two samples of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostStatus {
    /// No sample recorded yet.
    Unprobed,
    /// Latest sample is not anomalous.
    Normal,
    /// Latest sample is anomalous.
    Anomalous,
}

/// Flags latency spikes between consecutive samples.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use latwatch::{Sample, SpikeClassifier};
///
/// let classifier = SpikeClassifier::default();
/// let previous = Sample::from_attempts(1, &[Duration::from_millis(100)]);
/// let spike = Sample::from_attempts(1, &[Duration::from_millis(151)]);
/// assert!(classifier.evaluate(Some(&previous), &spike));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SpikeClassifier {
    /// Current latency must strictly exceed `spike_ratio` times the
    /// previous latency to count as a spike.
    pub spike_ratio: f64,
    /// Also flag total-loss samples as anomalous. Off by default; total
    /// loss is normally a distinct condition the consumer displays as a
    /// gap, not a spike.
    pub flag_total_loss: bool,
}

impl Default for SpikeClassifier {
    fn default() -> Self {
        Self {
            spike_ratio: DEFAULT_SPIKE_RATIO,
            flag_total_loss: false,
        }
    }
}

impl SpikeClassifier {
    /// Classify `current` against the sample that preceded it.
    ///
    /// Returns true iff both latencies are present and the current one
    /// strictly exceeds `spike_ratio` times the previous one. A first
    /// sample (`previous` is `None`) is never flagged under any
    /// configuration, and a total-loss sample on either side never takes
    /// part in the ratio test. With `flag_total_loss` set, a total-loss
    /// `current` after the first sample is flagged instead.
    pub fn evaluate(&self, previous: Option<&Sample>, current: &Sample) -> bool {
        if current.is_total_loss() {
            return self.flag_total_loss && previous.is_some();
        }
        match (previous.and_then(|p| p.latency_ms), current.latency_ms) {
            (Some(prev), Some(cur)) => cur as f64 > self.spike_ratio * prev as f64,
            _ => false,
        }
    }

    /// Derive a host's status from the last two samples of its series.
    pub fn status(&self, previous: Option<&Sample>, last: Option<&Sample>) -> HostStatus {
        match last {
            None => HostStatus::Unprobed,
            Some(current) if self.evaluate(previous, current) => HostStatus::Anomalous,
            Some(_) => HostStatus::Normal,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn sample(latency_ms: u64) -> Sample {
        Sample::from_attempts(1, &[Duration::from_millis(latency_ms)])
    }

    #[test]
    fn test_no_previous_is_never_a_spike() {
        let classifier = SpikeClassifier::default();
        assert!(!classifier.evaluate(None, &sample(500)));
        assert!(!classifier.evaluate(None, &Sample::total_loss()));
    }

    #[test]
    fn test_spike_above_threshold() {
        let classifier = SpikeClassifier::default();
        assert!(classifier.evaluate(Some(&sample(100)), &sample(151)));
    }

    #[test]
    fn test_exactly_threshold_is_not_a_spike() {
        // strict inequality: 150 == 1.5 * 100
        let classifier = SpikeClassifier::default();
        assert!(!classifier.evaluate(Some(&sample(100)), &sample(150)));
    }

    #[test]
    fn test_total_loss_previous_gives_no_baseline() {
        let classifier = SpikeClassifier::default();
        assert!(!classifier.evaluate(Some(&Sample::total_loss()), &sample(50)));
    }

    #[test]
    fn test_total_loss_current_not_a_spike_by_default() {
        let classifier = SpikeClassifier::default();
        assert!(!classifier.evaluate(Some(&sample(10)), &Sample::total_loss()));
    }

    #[test]
    fn test_total_loss_current_flagged_when_configured() {
        let classifier = SpikeClassifier {
            flag_total_loss: true,
            ..Default::default()
        };
        assert!(classifier.evaluate(Some(&sample(10)), &Sample::total_loss()));
        // a continuing outage keeps flagging
        assert!(classifier.evaluate(Some(&Sample::total_loss()), &Sample::total_loss()));
    }

    #[test]
    fn test_first_sample_never_flagged_even_for_total_loss() {
        let classifier = SpikeClassifier {
            flag_total_loss: true,
            ..Default::default()
        };
        assert!(!classifier.evaluate(None, &Sample::total_loss()));
        assert!(!classifier.evaluate(None, &sample(999)));
    }

    #[test]
    fn test_zero_previous_latency_uses_plain_ratio() {
        // 0ms baseline: any positive latency exceeds 1.5 * 0
        let classifier = SpikeClassifier::default();
        assert!(classifier.evaluate(Some(&sample(0)), &sample(1)));
        assert!(!classifier.evaluate(Some(&sample(0)), &sample(0)));
    }

    #[test]
    fn test_custom_ratio() {
        let classifier = SpikeClassifier {
            spike_ratio: 2.0,
            ..Default::default()
        };
        assert!(!classifier.evaluate(Some(&sample(100)), &sample(200)));
        assert!(classifier.evaluate(Some(&sample(100)), &sample(201)));
    }

    #[test]
    fn test_status_transitions() {
        let classifier = SpikeClassifier::default();
        assert_eq!(classifier.status(None, None), HostStatus::Unprobed);
        assert_eq!(
            classifier.status(None, Some(&sample(100))),
            HostStatus::Normal
        );
        assert_eq!(
            classifier.status(Some(&sample(100)), Some(&sample(151))),
            HostStatus::Anomalous
        );
        assert_eq!(
            classifier.status(Some(&sample(151)), Some(&sample(100))),
            HostStatus::Normal
        );
    }
}
