use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use surge_ping::{Client, Config, ICMP, PingIdentifier, PingSequence};
use tracing::{debug, trace};
use vpnprobe_common::config::AddressFamily;

use super::{EchoSummary, Pinger, ProbeError};

/// Gap between echo requests of one round, as `ping` does by default.
const SEND_INTERVAL: Duration = Duration::from_secs(1);

const PAYLOAD: [u8; 56] = [0; 56];

/// Echo rounds over ICMP sockets owned by this process.
///
/// Sockets are opened up front, one per address family in use. Unprivileged
/// datagram ICMP is tried first and raw sockets are the fallback, so the
/// process needs either `net.ipv4.ping_group_range` to cover it or
/// `CAP_NET_RAW`.
pub struct IcmpPinger {
    v4: Option<Client>,
    v6: Option<Client>,
}

impl IcmpPinger {
    pub fn new(family: AddressFamily) -> Result<Self, ProbeError> {
        let v4 = match family {
            AddressFamily::V4 | AddressFamily::Any => {
                Some(Client::new(&Config::default()).map_err(ProbeError::Socket)?)
            }
            AddressFamily::V6 => None,
        };
        let v6 = match family {
            AddressFamily::V6 | AddressFamily::Any => Some(
                Client::new(&Config::builder().kind(ICMP::V6).build())
                    .map_err(ProbeError::Socket)?,
            ),
            AddressFamily::V4 => None,
        };

        Ok(Self { v4, v6 })
    }

    fn client_for(&self, addr: IpAddr) -> Result<&Client, ProbeError> {
        match addr {
            IpAddr::V4(_) => self.v4.as_ref().ok_or(ProbeError::NoSocket("IPv4")),
            IpAddr::V6(_) => self.v6.as_ref().ok_or(ProbeError::NoSocket("IPv6")),
        }
    }
}

impl std::fmt::Debug for IcmpPinger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IcmpPinger")
            .field("v4", &self.v4.is_some())
            .field("v6", &self.v6.is_some())
            .finish()
    }
}

#[async_trait]
impl Pinger for IcmpPinger {
    async fn echo(
        &self,
        addr: IpAddr,
        count: u32,
        timeout: Duration,
    ) -> Result<EchoSummary, ProbeError> {
        let client = self.client_for(addr)?;
        let mut pinger = client.pinger(addr, PingIdentifier(rand::random())).await;
        pinger.timeout(timeout);

        let count = count.min(u32::from(u16::MAX));
        let mut rtts = Vec::with_capacity(count as usize);
        let mut ticker = tokio::time::interval(SEND_INTERVAL);

        for seq in 0..count {
            ticker.tick().await;
            match pinger.ping(PingSequence(seq as u16), &PAYLOAD).await {
                Ok((_, rtt)) => rtts.push(rtt),
                Err(e) => trace!(ip = %addr, seq, error = %e, "echo lost"),
            }
        }

        debug!(ip = %addr, count, received = rtts.len(), "icmp round finished");
        Ok(EchoSummary::from_samples(count, &rtts))
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
