//! The central orchestration of a scan.
//!
//! A [`Scan`] resolves every target, probes every unique address once, and
//! assembles a [`Report`] in the original target order. Both stages fan out
//! with their own worker limit.
//!
//! **Failure policy:**
//! A target that does not resolve is logged and skipped. A probe that gets no
//! reply is reported as unreachable. Only failures of the environment itself
//! (no target resolves at all, or the pinger cannot run) end the scan.

use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinError;
use vpnprobe_common::config::{Config, PingMethod};
use vpnprobe_common::target::Target;
use vpnprobe_common::{info, success, warn};

use crate::prober::{self, IcmpPinger, Pinger, ProbeError, ProbeResult, Prober, SystemPinger};
use crate::report::{Report, TargetOutcome, TargetReport};
use crate::resolver::{self, Resolver, SystemResolver};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Probe(#[from] ProbeError),
    #[error("none of the {0} targets resolved; is name resolution working?")]
    NothingResolved(usize),
    #[error("lookup task did not finish: {0}")]
    Interrupted(#[from] JoinError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolve,
    Probe,
}

/// Receives progress notifications while a scan runs.
///
/// Every method has an empty default, so observers only implement what they
/// display.
pub trait ScanProgress: Send + Sync {
    /// A stage is about to process `total` units.
    fn stage_started(&self, _stage: Stage, _total: usize) {}
    /// One unit of the stage completed.
    fn unit_done(&self, _stage: Stage) {}
    fn stage_finished(&self, _stage: Stage) {}
}

/// Observer that ignores everything.
pub struct NoProgress;

impl ScanProgress for NoProgress {}

pub struct Scan {
    resolver: Arc<dyn Resolver>,
    prober: Prober,
    resolve_workers: usize,
    probe_workers: usize,
    dedup: bool,
    progress: Arc<dyn ScanProgress>,
}

impl Scan {
    pub fn new(resolver: Arc<dyn Resolver>, prober: Prober) -> Self {
        Self {
            resolver,
            prober,
            resolve_workers: vpnprobe_common::config::DEFAULT_RESOLVE_WORKERS,
            probe_workers: vpnprobe_common::config::DEFAULT_PROBE_WORKERS,
            dedup: false,
            progress: Arc::new(NoProgress),
        }
    }

    /// Builds a scan with the system resolver and the pinger chosen in `cfg`.
    ///
    /// Opening ICMP sockets happens here, so a missing privilege shows up
    /// before any lookup is made.
    pub fn from_config(cfg: &Config) -> Result<Self, ProbeError> {
        let pinger: Arc<dyn Pinger> = match &cfg.ping {
            PingMethod::System { program } => Arc::new(SystemPinger::new(program.clone())),
            PingMethod::Native => Arc::new(IcmpPinger::new(cfg.family)?),
        };

        let scan = Scan::new(
            Arc::new(SystemResolver::new(cfg.family)),
            Prober::new(pinger, cfg.batch_count, cfg.timeout),
        )
        .with_workers(cfg.resolve_workers, cfg.probe_workers)
        .with_dedup(cfg.dedup);

        Ok(scan)
    }

    pub fn with_workers(mut self, resolve_workers: usize, probe_workers: usize) -> Self {
        self.resolve_workers = resolve_workers.max(1);
        self.probe_workers = probe_workers.max(1);
        self
    }

    /// List an address only under the first target that resolved to it.
    pub fn with_dedup(mut self, dedup: bool) -> Self {
        self.dedup = dedup;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ScanProgress>) -> Self {
        self.progress = progress;
        self
    }

    pub async fn run(&self, targets: &[Target]) -> Result<Report, ScanError> {
        let resolved = self.resolve_stage(targets).await?;

        let resolved_count = resolved.iter().filter(|r| r.is_ok()).count();
        if !targets.is_empty() && resolved_count == 0 {
            return Err(ScanError::NothingResolved(targets.len()));
        }

        let addrs = unique_addresses(&resolved);
        success!(
            "Resolved {resolved_count}/{} domains, {} unique IPs",
            targets.len(),
            addrs.len()
        );

        let results = self.probe_stage(addrs).await?;

        Ok(self.assemble(targets, resolved, &results))
    }

    async fn resolve_stage(
        &self,
        targets: &[Target],
    ) -> Result<Vec<Result<Vec<IpAddr>, resolver::ResolveError>>, JoinError> {
        info!(
            "Resolving {} domain names with {} workers...",
            targets.len(),
            self.resolve_workers.min(targets.len())
        );
        self.progress.stage_started(Stage::Resolve, targets.len());

        let resolved = resolver::resolve_all(
            self.resolver.clone(),
            targets,
            self.resolve_workers,
            || self.progress.unit_done(Stage::Resolve),
        )
        .await;

        self.progress.stage_finished(Stage::Resolve);
        let resolved = resolved?;

        for err in resolved.iter().filter_map(|r| r.as_ref().err()) {
            warn!(domain = err.domain(), error = %err, "skipping target");
        }
        Ok(resolved)
    }

    async fn probe_stage(
        &self,
        addrs: Vec<IpAddr>,
    ) -> Result<HashMap<IpAddr, ProbeResult>, ProbeError> {
        info!(
            "Pinging {} IPs with {} workers...",
            addrs.len(),
            self.probe_workers.min(addrs.len())
        );
        self.progress.stage_started(Stage::Probe, addrs.len());

        let results = prober::probe_all(&self.prober, addrs, self.probe_workers, || {
            self.progress.unit_done(Stage::Probe)
        })
        .await;

        self.progress.stage_finished(Stage::Probe);
        results
    }

    fn assemble(
        &self,
        targets: &[Target],
        resolved: Vec<Result<Vec<IpAddr>, resolver::ResolveError>>,
        results: &HashMap<IpAddr, ProbeResult>,
    ) -> Report {
        let mut listed: HashSet<IpAddr> = HashSet::new();

        let entries = targets
            .iter()
            .zip(resolved)
            .map(|(target, outcome)| {
                let outcome = match outcome {
                    Ok(ips) => TargetOutcome::Probed(
                        ips.into_iter()
                            .filter(|ip| !self.dedup || listed.insert(*ip))
                            .map(|ip| {
                                let result =
                                    results.get(&ip).cloned().unwrap_or(ProbeResult::Unreachable);
                                (ip, result)
                            })
                            .collect(),
                    ),
                    Err(e) => TargetOutcome::Unresolved(e),
                };
                TargetReport {
                    target: target.clone(),
                    outcome,
                }
            })
            .collect();

        Report::new(entries)
    }
}

/// Every resolved address once, in first-seen order.
fn unique_addresses(resolved: &[Result<Vec<IpAddr>, resolver::ResolveError>]) -> Vec<IpAddr> {
    let mut seen = HashSet::new();
    resolved
        .iter()
        .filter_map(|r| r.as_ref().ok())
        .flatten()
        .filter(|ip| seen.insert(**ip))
        .copied()
        .collect()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
