//! Per-host time series storage.
//!
//! The [`SeriesStore`] is the registry of every host's measurement history
//! for one monitoring session. Each host owns an independent append-only
//! series; a configurable cap bounds memory by evicting the oldest sample.

use std::collections::{HashMap, VecDeque};

use super::sample::Sample;

/// Default number of samples retained per host (10 minutes at a 1s cadence).
pub const DEFAULT_HISTORY_CAP: usize = 600;

/// Append-only per-host sample history.
///
/// One series per host, created lazily on the first append and kept for
/// the rest of the session. `append` is the only mutator; samples are
/// never modified in place, and arrival order is authoritative (no
/// reordering by timestamp, no deduplication).
///
/// # Example
///
/// ```
/// use latwatch::{Sample, SeriesStore};
///
/// let mut store = SeriesStore::new(Some(60));
/// store.append("10.0.0.1", Sample::total_loss());
/// assert_eq!(store.len("10.0.0.1"), 1);
/// assert!(store.last("10.0.0.1").unwrap().is_total_loss());
/// assert!(store.last("10.0.0.2").is_none());
/// ```
#[derive(Debug, Default)]
pub struct SeriesStore {
    /// Retention cap per host; `None` keeps unbounded history.
    cap: Option<usize>,
    series: HashMap<String, VecDeque<Sample>>,
}

impl SeriesStore {
    /// Create an empty store with the given per-host retention cap.
    pub fn new(cap: Option<usize>) -> Self {
        Self {
            cap,
            series: HashMap::new(),
        }
    }

    /// Append a sample to a host's series, creating the series if this is
    /// the host's first sample. Evicts the oldest sample when the cap is
    /// exceeded.
    pub fn append(&mut self, host: &str, sample: Sample) {
        let series = self.series.entry(host.to_string()).or_default();
        series.push_back(sample);
        if let Some(cap) = self.cap {
            while series.len() > cap {
                series.pop_front();
            }
        }
    }

    /// The most recently appended sample for a host, if any.
    pub fn last(&self, host: &str) -> Option<&Sample> {
        self.series.get(host)?.back()
    }

    /// The second most recently appended sample for a host, if any.
    ///
    /// Together with [`last`](Self::last) this is what anomaly status
    /// recomputation needs.
    pub fn previous(&self, host: &str) -> Option<&Sample> {
        let series = self.series.get(host)?;
        series.get(series.len().checked_sub(2)?)
    }

    /// Iterate over a host's samples in append order.
    ///
    /// Yields nothing for a host with no samples yet.
    pub fn samples<'a>(&'a self, host: &str) -> impl Iterator<Item = &'a Sample> {
        self.series.get(host).into_iter().flatten()
    }

    /// Number of retained samples for a host.
    pub fn len(&self, host: &str) -> usize {
        self.series.get(host).map_or(0, VecDeque::len)
    }

    /// Whether no host has recorded a sample yet.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Iterate over hosts that have at least one sample.
    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }
}
