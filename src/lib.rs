// Library crate: public API items may not be used by the binary
#![allow(unused)]

//! # latwatch
//!
//! A latency and packet-loss monitor for a fixed set of network hosts.
//!
//! latwatch probes every configured host on a fixed cadence, maintains a
//! rolling per-host time series of latency/loss measurements, and flags
//! samples whose latency spikes relative to the immediately preceding
//! sample. It emits a stream of `(host, sample, flag)` events for an
//! external consumer (the bundled binary writes them as JSON lines);
//! rendering and display decisions are entirely the consumer's.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                          Session                              │
//! │  ┌───────────┐ tick ┌────────┐ Sample ┌──────────────────┐    │
//! │  │ scheduler │─────▶│ probe  │───────▶│ data (store +    │    │
//! │  │ (cadence) │      │ (ICMP) │        │ classification)  │    │
//! │  └─────┬─────┘      └────────┘        └────────┬─────────┘    │
//! │        │                                       │              │
//! │        │        ProbeEvent { host, sample, anomaly }          │
//! │        └───────────────────────▶ mpsc ─────────┴──▶ consumer  │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`config`]**: session configuration, validation, and the
//!   `host = <address>` hosts-file loader
//! - **[`probe`]**: the [`Prober`] trait and the surge-ping based
//!   [`IcmpProber`]
//! - **[`data`]**: the [`Sample`] model, the [`SeriesStore`] per-host
//!   series registry, and the [`SpikeClassifier`]
//! - **[`scheduler`]**: the tick loop that ties them together
//! - **[`shutdown`]**: clean session teardown
//!
//! ## Semantics
//!
//! A probe sends a fixed number of echo attempts (default 4) with a
//! per-attempt timeout (default 4s). Latency is the rounded mean
//! round-trip of the successful attempts; when nothing replies the sample
//! carries no latency at all and 100% loss. A sample is anomalous when
//! its latency strictly exceeds 1.5x (configurable) the previous sample's
//! latency; total-loss samples never take part in that comparison. Every
//! per-host failure, from DNS to timeout, becomes a total-loss sample,
//! so a single unreachable host can never stall the session.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use latwatch::{IcmpProber, MonitorConfig, Scheduler, ShutdownController};
//!
//! # tokio_test::block_on(async {
//! let config = MonitorConfig::new(vec!["10.0.0.1".to_string()]);
//! let prober = Arc::new(IcmpProber::new(config.probe)?);
//! let (events, mut rx) = mpsc::channel(256);
//! let scheduler = Scheduler::new(config, prober, events)?;
//!
//! let (controller, signal) = ShutdownController::new();
//! tokio::spawn(scheduler.run(signal));
//! while let Some(event) = rx.recv().await {
//!     println!("{}: {:?} (anomaly: {})", event.host, event.sample.latency_ms, event.anomaly);
//! }
//! # Ok::<_, anyhow::Error>(())
//! # });
//! ```

pub mod config;
pub mod data;
pub mod probe;
pub mod scheduler;
pub mod shutdown;

// Re-export main types for convenience
pub use config::{load_hosts, ConfigError, MonitorConfig, ProbeConfig};
pub use data::{HostStatus, Sample, SeriesStore, SpikeClassifier};
pub use probe::{IcmpProber, ProbeSetupError, Prober};
pub use scheduler::{ProbeEvent, Scheduler};
pub use shutdown::{ShutdownController, ShutdownSignal};
