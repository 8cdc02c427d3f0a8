//! Data models for probe measurements.
//!
//! This module owns the measurement types and the session state derived
//! from them.
//!
//! ## Submodules
//!
//! - [`duration`]: Parsing and formatting of duration strings (e.g., "4s", "500ms")
//! - [`sample`]: The [`Sample`] measurement type and probe-attempt reduction
//! - [`store`]: The [`SeriesStore`] per-host time series registry
//! - [`anomaly`]: The [`SpikeClassifier`] and derived [`HostStatus`]
//!
//! ## Data flow
//!
//! ```text
//! raw probe attempts (rtts + failures)
//!        │
//!        ▼
//! Sample::from_attempts()
//!        │
//!        ├──▶ SeriesStore::append() (per-host history)
//!        │
//!        └──▶ SpikeClassifier::evaluate(previous, current) → anomaly flag
//! ```

pub mod anomaly;
pub mod duration;
pub mod sample;
pub mod store;

pub use anomaly::{HostStatus, SpikeClassifier, DEFAULT_SPIKE_RATIO};
pub use sample::Sample;
pub use store::{SeriesStore, DEFAULT_HISTORY_CAP};
