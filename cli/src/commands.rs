pub mod regions;
pub mod scan;

use std::time::Duration;

use clap::Parser;
use vpnprobe_common::config::{
    AddressFamily, Config, DEFAULT_BATCH_COUNT, DEFAULT_PING_PROGRAM, DEFAULT_PROBE_WORKERS,
    DEFAULT_RESOLVE_WORKERS, PingMethod,
};
use vpnprobe_common::target::{self, DEFAULT_SUFFIX, REGIONS, Target};

/// Running without arguments scans every known region.
#[derive(Parser, Debug)]
#[command(name = "vpnprobe", version)]
#[command(about = "Resolve VPN endpoints and measure their reachability and latency.")]
pub struct CommandLine {
    /// Only scan these regions (repeatable)
    #[arg(short, long = "region", value_name = "REGION")]
    pub regions: Vec<String>,

    /// Also scan this fully qualified domain (repeatable)
    #[arg(long = "domain", value_name = "DOMAIN")]
    pub domains: Vec<Target>,

    /// Suffix appended to region codes
    #[arg(long, default_value = DEFAULT_SUFFIX)]
    pub suffix: String,

    /// Concurrent DNS lookups
    #[arg(long, value_name = "N", default_value_t = DEFAULT_RESOLVE_WORKERS)]
    pub resolve_workers: usize,

    /// Concurrent probes
    #[arg(long, value_name = "N", default_value_t = DEFAULT_PROBE_WORKERS)]
    pub probe_workers: usize,

    /// Packets sent to each reachable address
    #[arg(short = 'c', long, value_name = "N", default_value_t = DEFAULT_BATCH_COUNT)]
    pub count: u32,

    /// Seconds to wait for each reply
    #[arg(short = 'W', long, value_name = "SECS", default_value_t = 1)]
    pub timeout: u64,

    /// Address family to resolve: v4, v6 or any
    #[arg(long, default_value_t = AddressFamily::V4)]
    pub family: AddressFamily,

    /// List an address only under the first domain that resolved to it
    #[arg(long)]
    pub dedup: bool,

    /// Send ICMP echo directly instead of running the ping binary
    #[arg(long, conflicts_with = "ping_bin")]
    pub native: bool,

    /// Ping binary to run
    #[arg(long, value_name = "PATH", default_value = DEFAULT_PING_PROGRAM)]
    pub ping_bin: String,

    /// Hide progress bars and informational logs
    #[arg(short, long)]
    pub quiet: bool,

    /// Print the built-in region list and exit
    #[arg(long)]
    pub list_regions: bool,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Turns the arguments into a validated scan configuration.
    ///
    /// With neither `--region` nor `--domain` every built-in region is
    /// scanned. Domains given with `--domain` follow the regions.
    pub fn to_config(&self) -> anyhow::Result<Config> {
        let regions: Vec<&str> = match (self.regions.is_empty(), self.domains.is_empty()) {
            (true, true) => REGIONS.to_vec(),
            (true, false) => Vec::new(),
            (false, _) => self.regions.iter().map(String::as_str).collect(),
        };

        let mut targets = target::from_regions(regions, &self.suffix)?;
        targets.extend(self.domains.iter().cloned());

        let ping = if self.native {
            PingMethod::Native
        } else {
            PingMethod::System {
                program: self.ping_bin.clone(),
            }
        };

        let cfg = Config {
            targets,
            resolve_workers: self.resolve_workers,
            probe_workers: self.probe_workers,
            batch_count: self.count,
            timeout: Duration::from_secs(self.timeout),
            family: self.family,
            dedup: self.dedup,
            ping,
        };
        cfg.validate()?;
        Ok(cfg)
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
