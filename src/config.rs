//! Monitoring session configuration.
//!
//! Collects the knobs of a session (host set, cadence, probe shape,
//! retention, classification) into [`MonitorConfig`] and validates them
//! up front: a session with an invalid configuration never starts, while
//! everything that can go wrong per host per tick is absorbed into
//! samples instead.

use std::fs;
use std::path::Path;
use std::time::Duration;

use regex::Regex;
use thiserror::Error;

use crate::data::{DEFAULT_HISTORY_CAP, DEFAULT_SPIKE_RATIO};

/// Configuration errors that are fatal at session startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No hosts to monitor.
    #[error("No hosts configured")]
    EmptyHosts,

    /// Tick interval of zero would spin.
    #[error("Tick interval must be greater than zero")]
    ZeroInterval,

    /// A probe must make at least one attempt.
    #[error("Probe attempt count must be greater than zero")]
    ZeroCount,

    /// Echo sequence numbers are 16-bit; more attempts cannot be numbered.
    #[error("Probe attempt count must be at most 65535 (got {0})")]
    CountTooLarge(usize),

    /// A zero timeout would fail every attempt immediately.
    #[error("Probe timeout must be greater than zero")]
    ZeroTimeout,

    /// The spike ratio must be a positive finite number.
    #[error("Spike ratio must be positive and finite (got {0})")]
    InvalidSpikeRatio(f64),

    /// The hosts file could not be read.
    #[error("Failed to read hosts file '{path}': {source}")]
    HostsFileUnreadable {
        path: String,
        source: std::io::Error,
    },

    /// The hosts file contained no `host = <address>` entries.
    #[error("No 'host = <address>' entries found in '{0}'")]
    HostsFileEmpty(String),
}

/// Shape of a single probe: how many echo attempts and how long each one
/// may wait for a reply.
#[derive(Debug, Clone, Copy)]
pub struct ProbeConfig {
    /// Number of echo attempts per probe.
    pub count: usize,
    /// Per-attempt reply timeout.
    pub timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            count: 4,
            timeout: Duration::from_secs(4),
        }
    }
}

/// Full configuration for one monitoring session.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Target addresses, fixed for the session.
    pub hosts: Vec<String>,
    /// Tick cadence.
    pub interval: Duration,
    /// Probe shape.
    pub probe: ProbeConfig,
    /// Per-host sample retention; `None` keeps unbounded history.
    pub history_cap: Option<usize>,
    /// Spike threshold for the anomaly classifier.
    pub spike_ratio: f64,
    /// Whether total-loss samples are flagged as anomalies.
    pub flag_total_loss: bool,
}

impl MonitorConfig {
    /// Configuration with defaults for everything but the host set.
    pub fn new(hosts: Vec<String>) -> Self {
        Self {
            hosts,
            interval: Duration::from_millis(1000),
            probe: ProbeConfig::default(),
            history_cap: Some(DEFAULT_HISTORY_CAP),
            spike_ratio: DEFAULT_SPIKE_RATIO,
            flag_total_loss: false,
        }
    }

    /// Validate the configuration before a session starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hosts.is_empty() {
            return Err(ConfigError::EmptyHosts);
        }
        if self.interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        if self.probe.count == 0 {
            return Err(ConfigError::ZeroCount);
        }
        if self.probe.count > u16::MAX as usize {
            return Err(ConfigError::CountTooLarge(self.probe.count));
        }
        if self.probe.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if !self.spike_ratio.is_finite() || self.spike_ratio <= 0.0 {
            return Err(ConfigError::InvalidSpikeRatio(self.spike_ratio));
        }
        Ok(())
    }
}

/// Extract target addresses from `host = <dotted-quad>` lines.
///
/// The hosts file is a loose key-value format; any line containing a
/// `host = 10.0.0.1` style assignment contributes one target, in file
/// order. Lines that don't match are ignored.
pub fn extract_hosts(content: &str) -> Vec<String> {
    // Compiled per call; host files are read once at startup.
    let re = Regex::new(r"host\s*=\s*([\d\.]+)").expect("static pattern compiles");
    re.captures_iter(content).map(|cap| cap[1].to_string()).collect()
}

/// Load target addresses from a hosts file.
///
/// Fails if the file cannot be read or yields no hosts, since a session
/// without targets can never produce anything.
pub fn load_hosts(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::HostsFileUnreadable {
        path: path.display().to_string(),
        source,
    })?;
    let hosts = extract_hosts(&content);
    if hosts.is_empty() {
        return Err(ConfigError::HostsFileEmpty(path.display().to_string()));
    }
    Ok(hosts)
}
