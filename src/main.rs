// Binary includes library modules - some public API items are only for library consumers
#![allow(unused)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod data;
mod probe;
mod scheduler;
mod shutdown;

use config::MonitorConfig;
use data::duration::{format_duration, parse_duration};
use data::DEFAULT_HISTORY_CAP;
use probe::IcmpProber;
use scheduler::{ProbeEvent, Scheduler};
use shutdown::ShutdownController;

#[derive(Parser, Debug)]
#[command(name = "latwatch")]
#[command(about = "Latency and packet-loss monitor with per-host anomaly flagging")]
struct Args {
    /// Hosts to monitor (IP addresses or resolvable names)
    #[arg(conflicts_with = "config")]
    hosts: Vec<String>,

    /// Read hosts from a config file with `host = <address>` lines
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Tick interval (e.g., "1s", "500ms"; bare numbers are milliseconds)
    #[arg(short, long, default_value = "1s")]
    interval: String,

    /// Echo attempts per probe
    #[arg(long, default_value = "4")]
    count: usize,

    /// Per-attempt reply timeout (e.g., "4s", "750ms")
    #[arg(long, default_value = "4s")]
    timeout: String,

    /// Samples retained per host (0 = unbounded)
    #[arg(long, default_value_t = DEFAULT_HISTORY_CAP)]
    history: usize,

    /// Latency ratio over the previous sample that counts as a spike
    #[arg(long, default_value = "1.5")]
    spike_ratio: f64,

    /// Also flag total-loss samples as anomalies
    #[arg(long)]
    flag_total_loss: bool,
}

impl Args {
    fn into_config(self) -> Result<MonitorConfig> {
        let hosts = match &self.config {
            Some(path) => config::load_hosts(path)?,
            None => self.hosts.clone(),
        };

        let mut config = MonitorConfig::new(hosts);
        config.interval =
            parse_duration(&self.interval).context("invalid --interval")?;
        config.probe.count = self.count;
        config.probe.timeout = parse_duration(&self.timeout).context("invalid --timeout")?;
        config.history_cap = (self.history > 0).then_some(self.history);
        config.spike_ratio = self.spike_ratio;
        config.flag_total_loss = self.flag_total_loss;
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let config = Args::parse().into_config()?;

    info!(
        hosts = config.hosts.len(),
        interval = %format_duration(config.interval),
        timeout = %format_duration(config.probe.timeout),
        count = config.probe.count,
        "starting latwatch"
    );

    // Raw-socket creation fails here, once, when privileges are missing
    let prober = Arc::new(
        IcmpProber::new(config.probe)
            .context("could not create ICMP prober; try running with elevated privileges")?,
    );

    let (events_tx, events_rx) = mpsc::channel(256);
    let scheduler = Scheduler::new(config, prober, events_tx)?;

    let (controller, signal) = ShutdownController::new();
    let session = tokio::spawn(scheduler.run(signal));
    let sink = tokio::spawn(emit_events(events_rx));

    tokio::signal::ctrl_c().await.context("failed to listen for ctrl-c")?;
    controller.shutdown();

    let store = session.await.context("session task failed")?;
    sink.await.context("sink task failed")?;

    info!(hosts = store.hosts().count(), "session finished");
    Ok(())
}

/// Write each probe event as one JSON object per line on stdout.
///
/// This is the external rendering boundary; anything that can read
/// newline-delimited JSON can consume the stream.
async fn emit_events(mut events: mpsc::Receiver<ProbeEvent>) {
    while let Some(event) = events.recv().await {
        match serde_json::to_string(&event) {
            Ok(line) => println!("{line}"),
            Err(e) => warn!("failed to serialize event: {e}"),
        }
    }
}
