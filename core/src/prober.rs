//! Reachability and latency probing.
//!
//! A probe is two echo rounds against one address: a single packet decides
//! reachability, and only a reachable address gets the larger batch whose
//! summary ends up in the report.
//!
//! **Architectural Note:**
//! The way echo requests leave the host is hidden behind [`Pinger`]. The
//! [`SystemPinger`] shells out to the `ping` binary; the [`IcmpPinger`] talks
//! ICMP directly. [`Prober`] only ever sees the trait.

use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::debug;

use crate::pool;

mod icmp;
mod summary;
mod system;

pub use icmp::IcmpPinger;
pub use summary::{EchoSummary, RttStats};
pub use system::SystemPinger;

/// Failures of the probing mechanism itself. These point at the host
/// environment, not at one address, and end the scan.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{program}' is not allowed to send echo requests: {message}")]
    Permission { program: String, message: String },
    #[error("failed to open ICMP socket: {0}")]
    Socket(#[source] std::io::Error),
    #[error("no ICMP socket open for {0} addresses")]
    NoSocket(&'static str),
    #[error("probe task did not finish: {0}")]
    Interrupted(#[from] JoinError),
}

/// What the report shows for one address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    Unreachable,
    /// Packet-loss line and round-trip line joined by `"; "`.
    Stats(String),
}

impl ProbeResult {
    pub fn is_reachable(&self) -> bool {
        matches!(self, ProbeResult::Stats(_))
    }
}

impl fmt::Display for ProbeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeResult::Unreachable => f.write_str("unreachable"),
            ProbeResult::Stats(text) => f.write_str(text),
        }
    }
}

/// Sends `count` echo requests to one address and summarizes the replies.
#[async_trait]
pub trait Pinger: Send + Sync {
    async fn echo(
        &self,
        addr: IpAddr,
        count: u32,
        timeout: Duration,
    ) -> Result<EchoSummary, ProbeError>;
}

/// Runs the two-round probe over a [`Pinger`].
#[derive(Clone)]
pub struct Prober {
    pinger: Arc<dyn Pinger>,
    batch_count: u32,
    timeout: Duration,
}

impl Prober {
    pub fn new(pinger: Arc<dyn Pinger>, batch_count: u32, timeout: Duration) -> Self {
        Self {
            pinger,
            batch_count,
            timeout,
        }
    }

    pub async fn probe(&self, addr: IpAddr) -> Result<ProbeResult, ProbeError> {
        let single = self.pinger.echo(addr, 1, self.timeout).await?;
        if !single.is_single_reply() {
            debug!(ip = %addr, "no reply to single echo");
            return Ok(ProbeResult::Unreachable);
        }

        let batch = self
            .pinger
            .echo(addr, self.batch_count, self.timeout)
            .await?;
        debug!(ip = %addr, sent = batch.transmitted, received = batch.received, "batch finished");
        Ok(ProbeResult::Stats(batch.text))
    }
}

/// Probes every address with at most `workers` probes in flight.
///
/// The first [`ProbeError`] cancels the probes still running and is returned
/// on its own.
pub async fn probe_all(
    prober: &Prober,
    addrs: Vec<IpAddr>,
    workers: usize,
    on_done: impl FnMut(),
) -> Result<HashMap<IpAddr, ProbeResult>, ProbeError> {
    let results = pool::fan_out(
        addrs,
        workers,
        |addr| {
            let prober = prober.clone();
            async move { prober.probe(addr).await.map(|result| (addr, result)) }
        },
        on_done,
    )
    .await?;

    Ok(results.into_iter().collect())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
