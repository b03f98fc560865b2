//! Test doubles for the resolver and the pinger.

use std::collections::HashMap;
use std::io;
use std::net::IpAddr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use vpnprobe_core::prober::{EchoSummary, Pinger, ProbeError};
use vpnprobe_core::resolver::{ResolveError, Resolver};
use vpnprobe_core::scanner::{ScanProgress, Stage};

pub fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

/// Tracks how many calls are inside a section at once.
#[derive(Default)]
pub struct Gauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl Gauge {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Answers lookups from a fixed table. Unknown names fail like NXDOMAIN.
#[derive(Default)]
pub struct StubResolver {
    answers: HashMap<String, Vec<IpAddr>>,
    delay: Duration,
    pub gauge: Gauge,
}

impl StubResolver {
    pub fn with(mut self, domain: &str, ips: &[&str]) -> Self {
        self.answers
            .insert(domain.to_string(), ips.iter().map(|s| ip(s)).collect());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl Resolver for StubResolver {
    async fn lookup(&self, domain: &str) -> Result<Vec<IpAddr>, ResolveError> {
        self.gauge.enter();
        tokio::time::sleep(self.delay).await;
        self.gauge.leave();

        self.answers
            .get(domain)
            .cloned()
            .ok_or_else(|| ResolveError::Lookup {
                domain: domain.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "NXDOMAIN"),
            })
    }
}

/// Replies only for addresses with a scripted batch text.
///
/// Every echo round is recorded so tests can check which rounds ran.
#[derive(Default)]
pub struct StubPinger {
    replies: HashMap<IpAddr, String>,
    delays: HashMap<IpAddr, Duration>,
    broken: bool,
    rounds: Mutex<Vec<(IpAddr, u32)>>,
    pub gauge: Gauge,
}

impl StubPinger {
    pub fn replying(mut self, addr: &str, batch_text: &str) -> Self {
        self.replies.insert(ip(addr), batch_text.to_string());
        self
    }

    pub fn delayed(mut self, addr: &str, delay: Duration) -> Self {
        self.delays.insert(ip(addr), delay);
        self
    }

    /// Every round fails as if the ping binary were missing.
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    pub fn rounds_for(&self, addr: &str) -> Vec<u32> {
        let addr = ip(addr);
        self.rounds
            .lock()
            .unwrap()
            .iter()
            .filter(|(a, _)| *a == addr)
            .map(|(_, count)| *count)
            .collect()
    }

    pub fn total_rounds(&self) -> usize {
        self.rounds.lock().unwrap().len()
    }
}

#[async_trait]
impl Pinger for StubPinger {
    async fn echo(
        &self,
        addr: IpAddr,
        count: u32,
        _timeout: Duration,
    ) -> Result<EchoSummary, ProbeError> {
        if self.broken {
            return Err(ProbeError::Spawn {
                program: "ping".to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
            });
        }

        self.rounds.lock().unwrap().push((addr, count));

        self.gauge.enter();
        let delay = self.delays.get(&addr).copied().unwrap_or(Duration::from_millis(1));
        tokio::time::sleep(delay).await;
        self.gauge.leave();

        let summary = match self.replies.get(&addr) {
            Some(text) => EchoSummary {
                transmitted: count,
                received: count,
                loss_percent: Some(0.0),
                text: text.clone(),
            },
            None => EchoSummary::from_samples(count, &[]),
        };
        Ok(summary)
    }
}

/// Counts progress notifications per stage.
#[derive(Default)]
pub struct CountingProgress {
    pub resolve_total: AtomicUsize,
    pub resolve_done: AtomicUsize,
    pub probe_total: AtomicUsize,
    pub probe_done: AtomicUsize,
    pub finished: AtomicUsize,
}

impl ScanProgress for CountingProgress {
    fn stage_started(&self, stage: Stage, total: usize) {
        match stage {
            Stage::Resolve => self.resolve_total.store(total, Ordering::SeqCst),
            Stage::Probe => self.probe_total.store(total, Ordering::SeqCst),
        }
    }

    fn unit_done(&self, stage: Stage) {
        match stage {
            Stage::Resolve => self.resolve_done.fetch_add(1, Ordering::SeqCst),
            Stage::Probe => self.probe_done.fetch_add(1, Ordering::SeqCst),
        };
    }

    fn stage_finished(&self, _stage: Stage) {
        self.finished.fetch_add(1, Ordering::SeqCst);
    }
}
