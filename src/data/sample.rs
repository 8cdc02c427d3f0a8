//! Probe measurement results.
//!
//! A [`Sample`] is one reduced measurement for one host at one tick:
//! the rounded mean round-trip time of the successful attempts, plus
//! the fraction of attempts that went unanswered.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;

/// One latency/loss measurement for a host.
///
/// `latency_ms` is `None` exactly when every probe attempt failed
/// (`loss_pct == 100.0`). A total-loss sample carries no latency at all,
/// not a zero or sentinel value, so it can never participate in
/// latency comparisons by accident.
///
/// Samples are immutable once created. On the wire the timestamp is
/// expressed as unix milliseconds under the `timestamp_ms` key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    /// Wall-clock time the measurement was taken.
    #[serde(rename = "timestamp_ms", serialize_with = "serialize_unix_millis")]
    pub taken_at: SystemTime,
    /// Rounded mean round-trip time of the successful attempts, in
    /// milliseconds. `None` when no attempt received a reply.
    pub latency_ms: Option<u64>,
    /// Percentage of attempts that received no reply, in `[0, 100]`.
    pub loss_pct: f64,
}

impl Sample {
    /// Reduce raw probe attempts into a sample.
    ///
    /// `sent` is the number of attempts made; `rtts` holds the round-trip
    /// time of each attempt that received a reply. An empty `rtts` (or a
    /// zero `sent`) yields a total-loss sample.
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use latwatch::Sample;
    ///
    /// let rtts = [Duration::from_millis(10), Duration::from_millis(12)];
    /// let sample = Sample::from_attempts(4, &rtts);
    /// assert_eq!(sample.latency_ms, Some(11));
    /// assert_eq!(sample.loss_pct, 50.0);
    /// ```
    pub fn from_attempts(sent: usize, rtts: &[Duration]) -> Self {
        if sent == 0 || rtts.is_empty() {
            return Self::total_loss();
        }

        let received = rtts.len().min(sent);
        let loss_pct = (sent - received) as f64 / sent as f64 * 100.0;

        let mean_ms =
            rtts.iter().map(Duration::as_secs_f64).sum::<f64>() / rtts.len() as f64 * 1000.0;

        Self {
            taken_at: SystemTime::now(),
            latency_ms: Some(mean_ms.round() as u64),
            loss_pct,
        }
    }

    /// A sample representing a tick in which no attempt received a reply.
    pub fn total_loss() -> Self {
        Self {
            taken_at: SystemTime::now(),
            latency_ms: None,
            loss_pct: 100.0,
        }
    }

    /// Whether this sample represents total loss (no comparable latency).
    pub fn is_total_loss(&self) -> bool {
        self.latency_ms.is_none()
    }

    /// Unix timestamp in milliseconds, for serialization.
    pub fn timestamp_ms(&self) -> u64 {
        unix_millis(self.taken_at)
    }
}

fn unix_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn serialize_unix_millis<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(unix_millis(*time))
}
