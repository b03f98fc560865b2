//! Echo round summaries.
//!
//! A summary is built either by parsing the text a `ping` binary printed, or
//! from round-trip samples collected in-process. In both cases the `text` is
//! the two report lines: packet loss, then round-trip timing.

use std::time::Duration;

/// Outcome of one echo round against one address.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EchoSummary {
    pub transmitted: u32,
    pub received: u32,
    /// `None` when no loss figure could be read.
    pub loss_percent: Option<f64>,
    pub text: String,
}

impl EchoSummary {
    /// True when exactly one packet went out and exactly one came back with no
    /// loss. Anything else, including unreadable output, is a miss.
    pub fn is_single_reply(&self) -> bool {
        self.transmitted == 1 && self.received == 1 && self.loss_percent == Some(0.0)
    }

    /// Parses the output of `ping -c N`.
    ///
    /// Counts come from the `N packets transmitted, M received, X% packet loss`
    /// line; the BSD `M packets received` wording is accepted too. The text is
    /// the last two lines of the trimmed output joined by `"; "`.
    pub fn parse(stdout: &str) -> Self {
        let mut summary = EchoSummary {
            text: last_two_lines(stdout),
            ..EchoSummary::default()
        };

        if let Some(line) = stdout.lines().find(|line| line.contains("transmitted")) {
            for part in line.split(',').map(str::trim) {
                let number = part.split_whitespace().next();
                if part.ends_with("transmitted") {
                    summary.transmitted = number.and_then(|n| n.parse().ok()).unwrap_or(0);
                } else if part.ends_with("received") {
                    summary.received = number.and_then(|n| n.parse().ok()).unwrap_or(0);
                } else if let Some(loss) = part.strip_suffix("% packet loss") {
                    summary.loss_percent = loss.trim().parse().ok();
                }
            }
        }

        summary
    }

    /// Builds a summary from in-process samples, worded the way iputils words
    /// its statistics.
    pub fn from_samples(transmitted: u32, rtts: &[Duration]) -> Self {
        let received = rtts.len() as u32;
        let loss = loss_percent(transmitted, received);
        let mut text = format!(
            "{transmitted} packets transmitted, {received} received, {}% packet loss",
            format_percent(loss)
        );

        if let Some(stats) = RttStats::from_samples(rtts) {
            text.push_str("; ");
            text.push_str(&stats.to_string());
        }

        EchoSummary {
            transmitted,
            received,
            loss_percent: Some(loss),
            text,
        }
    }
}

fn last_two_lines(stdout: &str) -> String {
    let lines: Vec<&str> = stdout.trim().lines().collect();
    let start = lines.len().saturating_sub(2);
    lines[start..].join("; ")
}

fn loss_percent(transmitted: u32, received: u32) -> f64 {
    if transmitted == 0 {
        return 0.0;
    }
    let lost = transmitted.saturating_sub(received);
    f64::from(lost) * 100.0 / f64::from(transmitted)
}

/// Whole numbers print bare, fractions with at most four decimals.
fn format_percent(value: f64) -> String {
    if value.fract() == 0.0 {
        return format!("{value:.0}");
    }
    let fixed = format!("{value:.4}");
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Round-trip statistics in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RttStats {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
    /// Population standard deviation.
    pub mdev: f64,
}

impl RttStats {
    pub fn from_samples(rtts: &[Duration]) -> Option<Self> {
        if rtts.is_empty() {
            return None;
        }

        let ms: Vec<f64> = rtts.iter().map(|d| d.as_secs_f64() * 1000.0).collect();
        let n = ms.len() as f64;
        let avg = ms.iter().sum::<f64>() / n;
        let variance = ms.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / n;

        Some(RttStats {
            min: ms.iter().copied().fold(f64::INFINITY, f64::min),
            max: ms.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            avg,
            mdev: variance.sqrt(),
        })
    }
}

impl std::fmt::Display for RttStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "rtt min/avg/max/mdev = {:.3}/{:.3}/{:.3}/{:.3} ms",
            self.min, self.avg, self.max, self.mdev
        )
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
