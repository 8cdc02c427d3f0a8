//! The probing loop.
//!
//! A single recurring timer drives ticks; within a tick every configured
//! host is probed concurrently, each result is classified against the
//! host's previous sample, appended to the series, and emitted to the
//! event channel. One host's failure never blocks the others: probe
//! failures arrive as total-loss samples, and a panicked probe task is
//! simply skipped for that tick.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use crate::config::{ConfigError, MonitorConfig};
use crate::data::{HostStatus, Sample, SeriesStore, SpikeClassifier};
use crate::probe::Prober;
use crate::shutdown::ShutdownSignal;

/// One `(host, sample, flag)` emission, one per host per tick.
///
/// Serializes flat: the sample's fields sit next to `host` and `anomaly`,
/// so one event is one self-contained JSON object on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeEvent {
    /// The probed host.
    pub host: String,
    /// The measurement taken this tick.
    #[serde(flatten)]
    pub sample: Sample,
    /// Whether the sample was classified as an anomaly.
    pub anomaly: bool,
}

/// Drives probing for every configured host on a fixed cadence.
///
/// Owns the session's [`SeriesStore`] and [`SpikeClassifier`]; probers
/// are shared behind an `Arc` so each per-host task holds its own handle
/// together with an owned copy of its target host, captured at task
/// creation time.
pub struct Scheduler {
    config: MonitorConfig,
    prober: Arc<dyn Prober>,
    classifier: SpikeClassifier,
    store: SeriesStore,
    events: mpsc::Sender<ProbeEvent>,
}

impl Scheduler {
    /// Create a scheduler for a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns the configuration error that would have made the session
    /// useless (no hosts, zero interval, bad probe shape or ratio).
    pub fn new(
        config: MonitorConfig,
        prober: Arc<dyn Prober>,
        events: mpsc::Sender<ProbeEvent>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let classifier = SpikeClassifier {
            spike_ratio: config.spike_ratio,
            flag_total_loss: config.flag_total_loss,
        };
        let store = SeriesStore::new(config.history_cap);
        Ok(Self {
            config,
            prober,
            classifier,
            store,
            events,
        })
    }

    /// The per-host series recorded so far.
    pub fn store(&self) -> &SeriesStore {
        &self.store
    }

    /// A host's current state, recomputed from its last two samples.
    pub fn host_status(&self, host: &str) -> HostStatus {
        self.classifier.status(self.store.previous(host), self.store.last(host))
    }

    /// Probe every host once.
    ///
    /// Probes run concurrently; classification and appends happen here on
    /// the scheduler task as results arrive, so each sample is compared
    /// against the series as it was before this tick's append for that
    /// host.
    pub async fn tick(&mut self) {
        let started = Instant::now();
        let mut probes = JoinSet::new();

        for host in &self.config.hosts {
            let prober = Arc::clone(&self.prober);
            let host = host.clone();
            probes.spawn(async move {
                let sample = prober.measure(&host).await;
                (host, sample)
            });
        }

        while let Some(joined) = probes.join_next().await {
            let (host, sample) = match joined {
                Ok(result) => result,
                Err(e) => {
                    // A panicked probe task loses one host for one tick;
                    // the rest of the tick proceeds.
                    warn!("probe task failed: {e}");
                    continue;
                }
            };

            let anomaly = self.classifier.evaluate(self.store.last(&host), &sample);
            if anomaly {
                warn!(
                    host = %host,
                    latency_ms = sample.latency_ms,
                    loss_pct = sample.loss_pct,
                    "anomalous sample"
                );
            }
            self.store.append(&host, sample.clone());

            // Best effort: a slow consumer drops events, never the tick
            let event = ProbeEvent { host, sample, anomaly };
            if let Err(e) = self.events.try_send(event) {
                trace!("event channel full or closed, dropping event: {e}");
            }
        }

        debug!(elapsed_ms = started.elapsed().as_millis() as u64, "tick complete");
    }

    /// Run ticks on the configured cadence until shutdown is raised.
    ///
    /// The first tick fires immediately. In-flight probes are abandoned
    /// on shutdown; since appends only happen on this task, the store can
    /// never hold a torn sample. Returns the store for inspection.
    pub async fn run(mut self, mut shutdown: ShutdownSignal) -> SeriesStore {
        info!(
            hosts = self.config.hosts.len(),
            interval_ms = self.config.interval.as_millis() as u64,
            "monitoring session started"
        );

        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick().await,
                _ = shutdown.raised() => {
                    info!("monitoring session stopping");
                    break;
                }
            }
        }

        self.store
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::shutdown::ShutdownController;

    /// Replays a scripted sequence of latencies per host; `None` entries
    /// are total-loss ticks. Repeats the last entry once exhausted.
    #[derive(Debug, Default)]
    struct ScriptedProber {
        scripts: HashMap<String, Vec<Option<u64>>>,
        cursor: Mutex<HashMap<String, usize>>,
    }

    impl ScriptedProber {
        fn script(mut self, host: &str, latencies: &[Option<u64>]) -> Self {
            self.scripts.insert(host.to_string(), latencies.to_vec());
            self
        }
    }

    #[async_trait]
    impl Prober for ScriptedProber {
        async fn measure(&self, host: &str) -> Sample {
            let Some(script) = self.scripts.get(host) else {
                return Sample::total_loss();
            };
            let mut cursor = self.cursor.lock().unwrap();
            let index = cursor.entry(host.to_string()).or_insert(0);
            let step = script.get(*index).or_else(|| script.last()).copied().flatten();
            *index += 1;
            match step {
                Some(ms) => Sample::from_attempts(4, &[Duration::from_millis(ms)]),
                None => Sample::total_loss(),
            }
        }
    }

    fn scheduler_with(
        hosts: &[&str],
        prober: ScriptedProber,
    ) -> (Scheduler, mpsc::Receiver<ProbeEvent>) {
        let config = MonitorConfig::new(hosts.iter().map(|h| h.to_string()).collect());
        let (tx, rx) = mpsc::channel(64);
        let scheduler = Scheduler::new(config, Arc::new(prober), tx).unwrap();
        (scheduler, rx)
    }

    fn events_by_host(events: &[ProbeEvent]) -> HashMap<&str, &ProbeEvent> {
        events.iter().map(|e| (e.host.as_str(), e)).collect()
    }

    async fn drain(rx: &mut mpsc::Receiver<ProbeEvent>) -> Vec<ProbeEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_rejects_invalid_config() {
        let (tx, _rx) = mpsc::channel(1);
        let err = Scheduler::new(MonitorConfig::new(Vec::new()), Arc::new(ScriptedProber::default()), tx);
        assert!(matches!(err, Err(ConfigError::EmptyHosts)));
    }

    #[tokio::test]
    async fn test_tick_emits_one_event_per_host() {
        let prober = ScriptedProber::default()
            .script("a", &[Some(10)])
            .script("c", &[Some(30)]);
        // host "b" has no script and fails entirely
        let (mut scheduler, mut rx) = scheduler_with(&["a", "b", "c"], prober);

        scheduler.tick().await;

        let events = drain(&mut rx).await;
        assert_eq!(events.len(), 3);
        let by_host = events_by_host(&events);
        assert_eq!(by_host["a"].sample.latency_ms, Some(10));
        assert!(by_host["b"].sample.is_total_loss());
        assert_eq!(by_host["c"].sample.latency_ms, Some(30));
        // every host got a series entry, including the failing one
        for host in ["a", "b", "c"] {
            assert_eq!(scheduler.store().len(host), 1);
        }
    }

    #[tokio::test]
    async fn test_spike_flagged_against_previous_tick() {
        let prober = ScriptedProber::default().script("a", &[Some(100), Some(151), Some(150)]);
        let (mut scheduler, mut rx) = scheduler_with(&["a"], prober);

        scheduler.tick().await;
        scheduler.tick().await;
        scheduler.tick().await;

        let flags: Vec<bool> = drain(&mut rx).await.iter().map(|e| e.anomaly).collect();
        // no baseline; then 151 > 1.5 * 100; then 150 vs a 151 baseline
        assert_eq!(flags, vec![false, true, false]);
    }

    #[tokio::test]
    async fn test_total_loss_is_not_a_spike() {
        let prober = ScriptedProber::default().script("a", &[Some(10), None, Some(50)]);
        let (mut scheduler, mut rx) = scheduler_with(&["a"], prober);

        for _ in 0..3 {
            scheduler.tick().await;
        }

        let flags: Vec<bool> = drain(&mut rx).await.iter().map(|e| e.anomaly).collect();
        // loss tick is not a spike, and the 50ms sample after it has no baseline
        assert_eq!(flags, vec![false, false, false]);
    }

    #[tokio::test]
    async fn test_host_status_recomputed_from_series() {
        let prober = ScriptedProber::default().script("a", &[Some(100), Some(151)]);
        let (mut scheduler, _rx) = scheduler_with(&["a"], prober);

        assert_eq!(scheduler.host_status("a"), HostStatus::Unprobed);
        scheduler.tick().await;
        assert_eq!(scheduler.host_status("a"), HostStatus::Normal);
        scheduler.tick().await;
        assert_eq!(scheduler.host_status("a"), HostStatus::Anomalous);
    }

    #[tokio::test]
    async fn test_full_event_channel_does_not_block_tick() {
        let prober = ScriptedProber::default().script("a", &[Some(10)]);
        let config = MonitorConfig::new(vec!["a".to_string()]);
        let (tx, mut rx) = mpsc::channel(1);
        let mut scheduler = Scheduler::new(config, Arc::new(prober), tx).unwrap();

        // second tick's event is dropped, but the series still grows
        scheduler.tick().await;
        scheduler.tick().await;
        assert_eq!(scheduler.store().len("a"), 2);
        assert_eq!(drain(&mut rx).await.len(), 1);
    }

    #[tokio::test]
    async fn test_event_serializes_flat() {
        let prober = ScriptedProber::default().script("a", &[Some(10)]);
        let (mut scheduler, mut rx) = scheduler_with(&["a"], prober);
        scheduler.tick().await;

        let event = rx.try_recv().unwrap();
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["host"], "a");
        assert_eq!(value["latency_ms"], 10);
        assert_eq!(value["loss_pct"], 75.0);
        assert_eq!(value["anomaly"], false);
        assert!(value["timestamp_ms"].is_u64());
        // the sample is flattened, not nested
        assert!(value.get("sample").is_none());
    }

    #[tokio::test]
    async fn test_run_ticks_until_shutdown() {
        let prober = ScriptedProber::default().script("a", &[Some(10)]);
        let mut config = MonitorConfig::new(vec!["a".to_string()]);
        config.interval = Duration::from_millis(5);
        let (tx, mut rx) = mpsc::channel(64);
        let scheduler = Scheduler::new(config, Arc::new(prober), tx).unwrap();

        let (controller, signal) = ShutdownController::new();
        let session = tokio::spawn(scheduler.run(signal));

        // wait for at least two emissions, then stop
        let first = rx.recv().await.expect("first event");
        let second = rx.recv().await.expect("second event");
        controller.shutdown();
        let store = session.await.unwrap();

        assert_eq!(first.host, "a");
        assert_eq!(second.host, "a");
        assert!(store.len("a") >= 2);
    }
}
