//! The scan report.
//!
//! Rendering is plain text and fully deterministic: targets in input order,
//! addresses ascending within each target.
//!
//! ```text
//! 1/2: example.test
//!     10.0.0.1        | 5 packets transmitted, 5 received, 0% packet loss; ...
//!     10.0.0.2        | unreachable
//! 2/2: broken.test
//!     unresolved
//! ```

use std::fmt;
use std::net::IpAddr;

use vpnprobe_common::target::Target;

use crate::prober::ProbeResult;
use crate::resolver::ResolveError;

/// Column width of the address field.
pub const ADDR_WIDTH: usize = 15;
const INDENT: &str = "    ";

#[derive(Debug)]
pub enum TargetOutcome {
    /// Addresses in ascending order with their probe results.
    Probed(Vec<(IpAddr, ProbeResult)>),
    Unresolved(ResolveError),
}

#[derive(Debug)]
pub struct TargetReport {
    pub target: Target,
    pub outcome: TargetOutcome,
}

/// Counts shown in the closing summary line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tally {
    pub targets: usize,
    pub unresolved: usize,
    pub addresses: usize,
    pub reachable: usize,
}

#[derive(Debug, Default)]
pub struct Report {
    entries: Vec<TargetReport>,
}

impl Report {
    pub fn new(entries: Vec<TargetReport>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[TargetReport] {
        &self.entries
    }

    pub fn tally(&self) -> Tally {
        let mut tally = Tally {
            targets: self.entries.len(),
            ..Tally::default()
        };

        for entry in &self.entries {
            match &entry.outcome {
                TargetOutcome::Probed(rows) => {
                    tally.addresses += rows.len();
                    tally.reachable += rows.iter().filter(|(_, r)| r.is_reachable()).count();
                }
                TargetOutcome::Unresolved(_) => tally.unresolved += 1,
            }
        }
        tally
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.entries.len();

        for (idx, entry) in self.entries.iter().enumerate() {
            writeln!(f, "{}/{total}: {}", idx + 1, entry.target)?;

            match &entry.outcome {
                TargetOutcome::Probed(rows) => {
                    for (ip, result) in rows {
                        writeln!(f, "{INDENT}{:<ADDR_WIDTH$} | {result}", ip.to_string())?;
                    }
                }
                TargetOutcome::Unresolved(_) => writeln!(f, "{INDENT}unresolved")?,
            }
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
