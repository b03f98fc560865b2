use std::sync::{Mutex, MutexGuard, PoisonError};

use indicatif::ProgressStyle;
use tracing::{Span, info_span};
use tracing_indicatif::span_ext::IndicatifSpanExt;
use vpnprobe_core::scanner::{ScanProgress, Stage};

const BAR_TEMPLATE: &str = "{spinner:.blue} {msg:<10} [{bar:32.cyan/blue}] {pos}/{len} ({elapsed})";
const TICK_STRINGS: &[&str] = &[
    "▁▁▁▁▁", "▁▂▂▂▁", "▁▄▂▄▁", "▂▄▆▄▂", "▄▆█▆▄", "▂▄▆▄▂", "▁▄▂▄▁", "▁▂▂▂▁", "▁▁▁▁▁",
];

/// One progress bar per scan stage, each carried by its own tracing span.
///
/// A bar appears when its stage starts and disappears when the stage's span is
/// dropped at the end of the stage.
#[derive(Default)]
pub struct StageBars {
    resolve: Mutex<Option<Span>>,
    probe: Mutex<Option<Span>>,
}

impl StageBars {
    /// Locks a stage's slot, recovering it if a holder panicked.
    fn slot(&self, stage: Stage) -> MutexGuard<'_, Option<Span>> {
        let slot = match stage {
            Stage::Resolve => &self.resolve,
            Stage::Probe => &self.probe,
        };
        slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ScanProgress for StageBars {
    fn stage_started(&self, stage: Stage, total: usize) {
        let (span, label) = match stage {
            Stage::Resolve => (info_span!("resolve", indicatif.pb_show = true), "resolving"),
            Stage::Probe => (info_span!("probe", indicatif.pb_show = true), "pinging"),
        };

        span.pb_set_style(&bar_style());
        span.pb_set_length(total as u64);
        span.pb_set_message(label);
        // The bar is drawn once the span has been entered.
        span.in_scope(|| {});

        *self.slot(stage) = Some(span);
    }

    fn unit_done(&self, stage: Stage) {
        if let Some(span) = self.slot(stage).as_ref() {
            span.pb_inc(1);
        }
    }

    fn stage_finished(&self, stage: Stage) {
        self.slot(stage).take();
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
        .tick_strings(TICK_STRINGS)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
