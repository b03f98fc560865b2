use std::net::IpAddr;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, trace};
use vpnprobe_common::config::DEFAULT_PING_PROGRAM;

use super::{EchoSummary, Pinger, ProbeError};

const PERMISSION_MARKERS: &[&str] = &["Operation not permitted", "Permission denied"];

/// Echo rounds through the host's `ping` binary.
///
/// Invoked as `ping -c <count> -W <seconds> <addr>`. A non-zero exit status
/// only means some replies were missing, and is read from the summary like
/// any other loss. The child is killed if its probe is dropped.
#[derive(Debug, Clone)]
pub struct SystemPinger {
    program: String,
}

impl SystemPinger {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command(&self, addr: IpAddr, count: u32, timeout: Duration) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-c")
            .arg(count.to_string())
            .arg("-W")
            .arg(timeout_secs(timeout).to_string())
            .arg(addr.to_string())
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

impl Default for SystemPinger {
    fn default() -> Self {
        Self::new(DEFAULT_PING_PROGRAM)
    }
}

#[async_trait]
impl Pinger for SystemPinger {
    async fn echo(
        &self,
        addr: IpAddr,
        count: u32,
        timeout: Duration,
    ) -> Result<EchoSummary, ProbeError> {
        let output = self
            .command(addr, count, timeout)
            .output()
            .await
            .map_err(|source| ProbeError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        trace!(ip = %addr, %stdout, %stderr, "ping output");

        let summary = read_output(&self.program, &stdout, &stderr)?;
        debug!(
            ip = %addr,
            count,
            status = ?output.status.code(),
            received = summary.received,
            "ping finished"
        );
        Ok(summary)
    }
}

/// Turns one `ping` run into a summary.
///
/// Only a refusal to open the ICMP socket is an error. That shows up as a
/// `socket:` line on stderr, or as a permission message with no statistics
/// printed at all. A per-destination refusal such as `sendmsg: Operation not
/// permitted` still comes with statistics and reads as loss.
fn read_output(program: &str, stdout: &str, stderr: &str) -> Result<EchoSummary, ProbeError> {
    let has_statistics = stdout.lines().any(|line| line.contains("packets transmitted"));

    for line in stderr.lines() {
        let Some(marker) = PERMISSION_MARKERS.iter().find(|m| line.contains(*m)) else {
            continue;
        };
        if line.contains("socket:") || !has_statistics {
            return Err(ProbeError::Permission {
                program: program.to_string(),
                message: line.trim().to_string(),
            });
        }
        debug!(%program, refused = marker, "destination refused, reading as loss");
    }

    Ok(EchoSummary::parse(stdout))
}

/// `-W` takes whole seconds; anything below one second rounds up to one.
fn timeout_secs(timeout: Duration) -> u64 {
    let secs = timeout.as_secs();
    if timeout.subsec_nanos() > 0 { secs + 1 } else { secs.max(1) }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
