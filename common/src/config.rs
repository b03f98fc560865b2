use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::target::{self, Target};

pub const DEFAULT_RESOLVE_WORKERS: usize = 128;
pub const DEFAULT_PROBE_WORKERS: usize = 1024;
pub const DEFAULT_BATCH_COUNT: u32 = 50;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);
pub const DEFAULT_PING_PROGRAM: &str = "ping";

/// Which address families a lookup keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressFamily {
    /// IPv4 only.
    #[default]
    V4,
    /// IPv6 only.
    V6,
    /// Both, IPv4 first.
    Any,
}

impl AddressFamily {
    pub fn accepts(&self, ip: &std::net::IpAddr) -> bool {
        match self {
            AddressFamily::V4 => ip.is_ipv4(),
            AddressFamily::V6 => ip.is_ipv6(),
            AddressFamily::Any => true,
        }
    }
}

impl FromStr for AddressFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "v4" | "ipv4" | "4" => Ok(AddressFamily::V4),
            "v6" | "ipv6" | "6" => Ok(AddressFamily::V6),
            "any" | "all" => Ok(AddressFamily::Any),
            _ => Err(format!("invalid address family: {s} (expected v4, v6 or any)")),
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AddressFamily::V4 => "v4",
            AddressFamily::V6 => "v6",
            AddressFamily::Any => "any",
        };
        f.write_str(name)
    }
}

/// Selects the mechanism that sends echo requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PingMethod {
    /// Spawn the host's ping binary.
    System { program: String },
    /// Send ICMP echo from this process.
    Native,
}

impl Default for PingMethod {
    fn default() -> Self {
        PingMethod::System {
            program: DEFAULT_PING_PROGRAM.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no targets to scan")]
    NoTargets,
    #[error("{0} must be at least 1")]
    ZeroWorkers(&'static str),
    #[error("batch packet count must be at least 1")]
    ZeroCount,
    #[error("probe timeout must be at least one second")]
    TimeoutTooShort,
}

/// Everything a scan needs to know. Built once by the caller and passed down.
#[derive(Debug, Clone)]
pub struct Config {
    /// Domains to scan, in report order.
    pub targets: Vec<Target>,
    /// Upper bound on concurrent lookups.
    pub resolve_workers: usize,
    /// Upper bound on concurrent probes.
    pub probe_workers: usize,
    /// Packets sent by the batch probe of a reachable address.
    pub batch_count: u32,
    /// Per-packet reply timeout. `ping -W` takes whole seconds.
    pub timeout: Duration,
    pub family: AddressFamily,
    /// List an address only under the first target that resolved to it.
    pub dedup: bool,
    pub ping: PingMethod,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            targets: target::default_targets(),
            resolve_workers: DEFAULT_RESOLVE_WORKERS,
            probe_workers: DEFAULT_PROBE_WORKERS,
            batch_count: DEFAULT_BATCH_COUNT,
            timeout: DEFAULT_TIMEOUT,
            family: AddressFamily::default(),
            dedup: false,
            ping: PingMethod::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.targets.is_empty() {
            return Err(ConfigError::NoTargets);
        }
        if self.resolve_workers == 0 {
            return Err(ConfigError::ZeroWorkers("resolve workers"));
        }
        if self.probe_workers == 0 {
            return Err(ConfigError::ZeroWorkers("probe workers"));
        }
        if self.batch_count == 0 {
            return Err(ConfigError::ZeroCount);
        }
        if self.timeout < Duration::from_secs(1) {
            return Err(ConfigError::TimeoutTooShort);
        }
        Ok(())
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
