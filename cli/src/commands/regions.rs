use std::io::Write;

use vpnprobe_common::target::REGIONS;

/// Prints every built-in region with the domain it expands to.
pub fn list(suffix: &str) -> anyhow::Result<()> {
    let width = REGIONS.iter().map(|r| r.len()).max().unwrap_or(0);
    let mut out = std::io::stdout().lock();

    for region in REGIONS {
        writeln!(out, "{region:<width$}  {region}{suffix}")?;
    }
    out.flush()?;
    Ok(())
}
