//! ICMP echo prober built on surge-ping.
//!
//! Sends a fixed number of echo requests per measurement and reduces the
//! replies to a [`Sample`]. Socket creation happens once at construction
//! time, so a missing raw-socket privilege surfaces as a startup error
//! instead of an endless stream of total-loss samples.

use std::net::IpAddr;
use std::time::Duration;

use rand::random;
use surge_ping::{Client, Config, PingIdentifier, PingSequence, ICMP};
use thiserror::Error;
use tokio::net::lookup_host;
use tracing::{debug, warn};

use super::Prober;
use crate::config::ProbeConfig;
use crate::data::Sample;

/// Echo payload; 56 data bytes, matching the classic ping default.
const PAYLOAD: [u8; 56] = [0; 56];

/// Probe socket creation failed at startup.
///
/// ICMP sockets usually need elevated privileges (or a permissive
/// `net.ipv4.ping_group_range`), so this is reported once, before the
/// session starts, rather than per tick.
#[derive(Debug, Error)]
#[error("Failed to create ICMP socket (raw sockets may require elevated privileges): {0}")]
pub struct ProbeSetupError(#[from] std::io::Error);

/// Probes hosts with ICMP echo requests.
///
/// Holds one IPv4 client and, where the platform allows it, one IPv6
/// client. Both are cheap handles over a shared socket; the prober can be
/// cloned freely across probe tasks.
///
/// # Example
///
/// ```no_run
/// use latwatch::{IcmpProber, ProbeConfig, Prober};
///
/// # tokio_test::block_on(async {
/// let prober = IcmpProber::new(ProbeConfig::default())?;
/// let sample = prober.measure("192.0.2.1").await;
/// println!("loss: {}%", sample.loss_pct);
/// # Ok::<_, latwatch::ProbeSetupError>(())
/// # });
/// ```
#[derive(Clone)]
pub struct IcmpProber {
    config: ProbeConfig,
    v4: Client,
    v6: Option<Client>,
}

impl IcmpProber {
    /// Create the echo clients.
    ///
    /// Fails when no IPv4 ICMP socket can be created, since no host could
    /// ever be probed. A failed IPv6 socket only logs a warning; IPv6
    /// targets then report total loss.
    pub fn new(config: ProbeConfig) -> Result<Self, ProbeSetupError> {
        let v4 = Client::new(&Config::default())?;
        let v6 = match Client::new(&Config::builder().kind(ICMP::V6).build()) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("IPv6 ICMP socket unavailable, IPv6 targets will report loss: {e}");
                None
            }
        };
        Ok(Self { config, v4, v6 })
    }

    fn client_for(&self, addr: IpAddr) -> Option<&Client> {
        match addr {
            IpAddr::V4(_) => Some(&self.v4),
            IpAddr::V6(_) => self.v6.as_ref(),
        }
    }
}

#[async_trait::async_trait]
impl Prober for IcmpProber {
    async fn measure(&self, host: &str) -> Sample {
        let Some(addr) = resolve(host).await else {
            return Sample::total_loss();
        };
        let Some(client) = self.client_for(addr) else {
            debug!(host, %addr, "no ICMP client for address family");
            return Sample::total_loss();
        };

        let mut pinger = client.pinger(addr, PingIdentifier(random())).await;
        pinger.timeout(self.config.timeout);

        let mut rtts: Vec<Duration> = Vec::with_capacity(self.config.count);
        for seq in 0..self.config.count {
            match pinger.ping(PingSequence(seq as u16), &PAYLOAD).await {
                Ok((_reply, rtt)) => rtts.push(rtt),
                Err(e) => debug!(host, seq, "echo attempt failed: {e}"),
            }
        }

        Sample::from_attempts(self.config.count, &rtts)
    }
}

/// Resolve a host string to an address.
///
/// IP literals skip DNS entirely; otherwise the first resolved address
/// wins. Resolution failure yields `None` and is the caller's cue to
/// record total loss.
async fn resolve(host: &str) -> Option<IpAddr> {
    if let Ok(addr) = host.parse::<IpAddr>() {
        return Some(addr);
    }
    match lookup_host((host, 0)).await {
        Ok(mut addrs) => addrs.next().map(|sock| sock.ip()),
        Err(e) => {
            debug!(host, "name resolution failed: {e}");
            None
        }
    }
}
