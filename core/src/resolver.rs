//! Domain name resolution.
//!
//! [`Resolver`] is the seam between the scan and the host's name service.
//! [`resolve_all`] applies the ordering rules on top of any implementation:
//! addresses are sorted ascending by numeric value (IPv4 before IPv6) and
//! duplicates within one domain are dropped. Overlap across domains is kept.

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::debug;
use vpnprobe_common::config::AddressFamily;
use vpnprobe_common::target::Target;

use crate::pool;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to resolve {domain}: {source}")]
    Lookup {
        domain: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{domain} resolved to no usable addresses")]
    NoAddresses { domain: String },
}

impl ResolveError {
    pub fn domain(&self) -> &str {
        match self {
            ResolveError::Lookup { domain, .. } | ResolveError::NoAddresses { domain } => domain,
        }
    }
}

/// Maps a domain name to the addresses it currently resolves to.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn lookup(&self, domain: &str) -> Result<Vec<IpAddr>, ResolveError>;
}

/// Resolves through the operating system (`getaddrinfo`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver {
    family: AddressFamily,
}

impl SystemResolver {
    pub fn new(family: AddressFamily) -> Self {
        Self { family }
    }
}

#[async_trait]
impl Resolver for SystemResolver {
    async fn lookup(&self, domain: &str) -> Result<Vec<IpAddr>, ResolveError> {
        let addrs = tokio::net::lookup_host((domain, 0))
            .await
            .map_err(|source| ResolveError::Lookup {
                domain: domain.to_string(),
                source,
            })?;

        let ips: Vec<IpAddr> = addrs
            .map(|sock| sock.ip())
            .filter(|ip| self.family.accepts(ip))
            .collect();

        debug!(domain, count = ips.len(), family = %self.family, "lookup finished");
        Ok(ips)
    }
}

/// Sorts ascending and removes repeats.
pub fn sort_addresses(mut ips: Vec<IpAddr>) -> Vec<IpAddr> {
    ips.sort_unstable();
    ips.dedup();
    ips
}

/// Resolves one domain and normalizes the answer.
pub async fn resolve(resolver: &dyn Resolver, domain: &str) -> Result<Vec<IpAddr>, ResolveError> {
    let ips = sort_addresses(resolver.lookup(domain).await?);
    if ips.is_empty() {
        return Err(ResolveError::NoAddresses {
            domain: domain.to_string(),
        });
    }
    Ok(ips)
}

/// Resolves every target with at most `workers` lookups in flight.
///
/// The returned vector is parallel to `targets`. A failed lookup only affects
/// its own slot; only a cancelled lookup task fails the whole call.
pub async fn resolve_all(
    resolver: Arc<dyn Resolver>,
    targets: &[Target],
    workers: usize,
    on_done: impl FnMut(),
) -> Result<Vec<Result<Vec<IpAddr>, ResolveError>>, JoinError> {
    let domains: Vec<String> = targets.iter().map(|t| t.domain().to_string()).collect();

    pool::fan_out(
        domains,
        workers,
        |domain| {
            let resolver = resolver.clone();
            async move { Ok::<_, JoinError>(resolve(resolver.as_ref(), &domain).await) }
        },
        on_done,
    )
    .await
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
