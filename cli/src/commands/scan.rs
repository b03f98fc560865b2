use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use vpnprobe_common::config::{Config, PingMethod};
use vpnprobe_core::prober::ProbeError;
use vpnprobe_core::scanner::{NoProgress, Scan, ScanProgress};

use crate::terminal::{print, progress::StageBars};

pub async fn scan(cfg: &Config, show_bars: bool) -> anyhow::Result<()> {
    let progress: Arc<dyn ScanProgress> = if show_bars {
        Arc::new(StageBars::default())
    } else {
        Arc::new(NoProgress)
    };

    let scan = Scan::from_config(cfg)
        .map_err(|e| explain_probe_error(e, cfg))?
        .with_progress(progress);

    let start_time = Instant::now();
    let report = scan
        .run(&cfg.targets)
        .await
        .map_err(anyhow::Error::from)
        .context("scan aborted")?;

    print::report(&report)?;
    print::summary(&report.tally(), start_time.elapsed());
    Ok(())
}

/// Adds a hint when native ICMP fails for lack of privilege.
fn explain_probe_error(err: ProbeError, cfg: &Config) -> anyhow::Error {
    let needs_hint = matches!(err, ProbeError::Socket(_))
        && cfg.ping == PingMethod::Native
        && !is_root::is_root();

    let err = anyhow::Error::from(err);
    if needs_hint {
        err.context("native ICMP needs root, CAP_NET_RAW or a matching net.ipv4.ping_group_range")
    } else {
        err
    }
}
