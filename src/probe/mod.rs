//! Probing abstraction for measuring one host.
//!
//! This module provides a trait-based seam between the scheduling loop and
//! the actual network probing, so the loop can be driven by the real ICMP
//! prober in production and by scripted probers in tests.

mod icmp;

pub use icmp::{IcmpProber, ProbeSetupError};

use async_trait::async_trait;

use crate::data::Sample;

/// Measures latency and packet loss to a single host.
///
/// `measure` never fails: every per-host problem (unreachable target,
/// name resolution failure, timeouts) is absorbed into a total-loss
/// [`Sample`], so one host's trouble can never abort a tick. Setup-level
/// problems (no raw-socket privilege) belong to prober construction, not
/// to `measure`.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Probe `host` once and reduce the attempts to a sample.
    ///
    /// Bounded by `count x timeout` of the probe configuration; each
    /// attempt carries its own timeout and failed attempts are not
    /// retried.
    async fn measure(&self, host: &str) -> Sample;
}
