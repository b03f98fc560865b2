use std::io::Write;
use std::time::Duration;

use colored::*;
use vpnprobe_common::{success, warn};
use vpnprobe_core::report::{Report, Tally};

/// Writes the report to stdout. A closed or broken stdout is fatal.
pub fn report(report: &Report) -> std::io::Result<()> {
    let mut out = std::io::stdout().lock();
    write!(out, "{report}")?;
    out.flush()
}

/// Logs the closing counts to stderr.
pub fn summary(tally: &Tally, total_time: Duration) {
    let reachable = format!("{}/{}", tally.reachable, tally.addresses).bold().green();
    let elapsed = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();

    success!("{reachable} addresses reachable across {} domains in {elapsed}", tally.targets);

    if tally.unresolved > 0 {
        let unresolved = tally.unresolved.to_string().bold().red();
        warn!("{unresolved} domains did not resolve");
    }
}
