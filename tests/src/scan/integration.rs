use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use vpnprobe_common::target::Target;
use vpnprobe_core::prober::{ProbeError, ProbeResult, Prober};
use vpnprobe_core::report::TargetOutcome;
use vpnprobe_core::scanner::{Scan, ScanError};

use crate::support::{CountingProgress, StubPinger, StubResolver, ip};

const STATS: &str = "5 packets transmitted, 5 received, 0% packet loss; \
                     round-trip min/avg/max = 1.0/1.2/1.5 ms";

fn targets(domains: &[&str]) -> Vec<Target> {
    domains.iter().map(|d| d.parse().unwrap()).collect()
}

fn scan_with(resolver: Arc<StubResolver>, pinger: Arc<StubPinger>) -> Scan {
    Scan::new(resolver, Prober::new(pinger, 50, Duration::from_secs(1)))
}

#[tokio::test]
async fn end_to_end_report() {
    let resolver = Arc::new(StubResolver::default().with("example.test", &["10.0.0.2", "10.0.0.1"]));
    let pinger = Arc::new(StubPinger::default().replying("10.0.0.1", STATS));

    let report = scan_with(resolver, pinger)
        .run(&targets(&["example.test"]))
        .await
        .unwrap();

    let expected = "\
1/1: example.test
    10.0.0.1        | 5 packets transmitted, 5 received, 0% packet loss; round-trip min/avg/max = 1.0/1.2/1.5 ms
    10.0.0.2        | unreachable
";
    assert_eq!(report.to_string(), expected);
}

#[tokio::test]
async fn unreachable_address_never_gets_batch_probe() {
    let resolver = Arc::new(StubResolver::default().with("example.test", &["10.0.0.2", "10.0.0.1"]));
    let pinger = Arc::new(StubPinger::default().replying("10.0.0.1", STATS));

    scan_with(resolver, pinger.clone())
        .run(&targets(&["example.test"]))
        .await
        .unwrap();

    assert_eq!(pinger.rounds_for("10.0.0.1"), vec![1, 50]);
    assert_eq!(pinger.rounds_for("10.0.0.2"), vec![1]);
    assert_eq!(pinger.total_rounds(), 3);
}

#[tokio::test]
async fn printed_order_ignores_completion_order() {
    let resolver = Arc::new(
        StubResolver::default()
            .with("slow.test", &["10.0.0.10", "10.0.0.9", "10.0.0.100"])
            .with("fast.test", &["192.168.0.1"]),
    );
    // Higher addresses answer first.
    let pinger = Arc::new(
        StubPinger::default()
            .replying("10.0.0.9", "a")
            .replying("10.0.0.10", "b")
            .replying("10.0.0.100", "c")
            .replying("192.168.0.1", "d")
            .delayed("10.0.0.9", Duration::from_millis(30))
            .delayed("10.0.0.10", Duration::from_millis(20))
            .delayed("10.0.0.100", Duration::from_millis(10)),
    );

    let report = scan_with(resolver, pinger)
        .run(&targets(&["slow.test", "fast.test"]))
        .await
        .unwrap();

    let expected = "\
1/2: slow.test
    10.0.0.9        | a
    10.0.0.10       | b
    10.0.0.100      | c
2/2: fast.test
    192.168.0.1     | d
";
    assert_eq!(report.to_string(), expected);
}

#[tokio::test]
async fn worker_limits_are_respected() {
    let mut resolver = StubResolver::default().with_delay(Duration::from_millis(5));
    let mut domains = Vec::new();
    let mut pinger = StubPinger::default();

    for d in 0..12u8 {
        let domain = format!("d{d}.test");
        let addrs: Vec<String> = (1..=4u8).map(|h| format!("10.{d}.0.{h}")).collect();
        let addr_refs: Vec<&str> = addrs.iter().map(String::as_str).collect();
        resolver = resolver.with(&domain, &addr_refs);
        for addr in &addrs {
            pinger = pinger
                .replying(addr, "ok")
                .delayed(addr, Duration::from_millis(3));
        }
        domains.push(domain);
    }

    let resolver = Arc::new(resolver);
    let pinger = Arc::new(pinger);
    let domain_refs: Vec<&str> = domains.iter().map(String::as_str).collect();

    let report = scan_with(resolver.clone(), pinger.clone())
        .with_workers(3, 5)
        .run(&targets(&domain_refs))
        .await
        .unwrap();

    assert_eq!(report.tally().addresses, 48);
    assert_eq!(report.tally().reachable, 48);
    assert!(resolver.gauge.peak() <= 3, "resolver peak {}", resolver.gauge.peak());
    assert!(pinger.gauge.peak() <= 5, "pinger peak {}", pinger.gauge.peak());
    assert!(pinger.gauge.peak() >= 2);
}

#[tokio::test]
async fn unresolved_target_is_skipped() {
    let resolver = Arc::new(StubResolver::default().with("ok.test", &["10.0.0.1"]));
    let pinger = Arc::new(StubPinger::default());

    let report = scan_with(resolver, pinger)
        .run(&targets(&["missing.test", "ok.test"]))
        .await
        .unwrap();

    assert!(matches!(report.entries()[0].outcome, TargetOutcome::Unresolved(_)));
    assert_eq!(
        report.to_string(),
        "1/2: missing.test\n    unresolved\n2/2: ok.test\n    10.0.0.1        | unreachable\n"
    );

    let tally = report.tally();
    assert_eq!(tally.unresolved, 1);
    assert_eq!(tally.reachable, 0);
}

#[tokio::test]
async fn nothing_resolved_is_fatal() {
    let resolver = Arc::new(StubResolver::default());
    let pinger = Arc::new(StubPinger::default());

    let err = scan_with(resolver, pinger.clone())
        .run(&targets(&["a.test", "b.test"]))
        .await
        .unwrap_err();

    assert!(matches!(err, ScanError::NothingResolved(2)));
    assert_eq!(pinger.total_rounds(), 0);
}

#[tokio::test]
async fn shared_addresses_are_probed_once() {
    let resolver = Arc::new(
        StubResolver::default()
            .with("a.test", &["10.0.0.1", "10.0.0.2"])
            .with("b.test", &["10.0.0.2", "10.0.0.3"]),
    );
    let pinger = Arc::new(StubPinger::default().replying("10.0.0.2", "shared"));

    let report = scan_with(resolver.clone(), pinger.clone())
        .run(&targets(&["a.test", "b.test"]))
        .await
        .unwrap();

    assert_eq!(pinger.rounds_for("10.0.0.2"), vec![1, 50]);
    assert_eq!(
        report.to_string(),
        "\
1/2: a.test
    10.0.0.1        | unreachable
    10.0.0.2        | shared
2/2: b.test
    10.0.0.2        | shared
    10.0.0.3        | unreachable
"
    );

    let deduped = scan_with(resolver, pinger)
        .with_dedup(true)
        .run(&targets(&["a.test", "b.test"]))
        .await
        .unwrap();

    match &deduped.entries()[1].outcome {
        TargetOutcome::Probed(rows) => {
            assert_eq!(rows, &vec![(ip("10.0.0.3"), ProbeResult::Unreachable)]);
        }
        TargetOutcome::Unresolved(e) => panic!("unexpected resolve error: {e}"),
    }
}

#[tokio::test]
async fn spawn_failure_aborts_scan() {
    let resolver = Arc::new(StubResolver::default().with("a.test", &["10.0.0.1", "10.0.0.2"]));
    let pinger = Arc::new(StubPinger::broken());

    let err = scan_with(resolver, pinger)
        .run(&targets(&["a.test"]))
        .await
        .unwrap_err();

    assert!(matches!(err, ScanError::Probe(ProbeError::Spawn { .. })));
}

#[tokio::test]
async fn progress_is_reported_per_unit() {
    let resolver = Arc::new(
        StubResolver::default()
            .with("a.test", &["10.0.0.1", "10.0.0.2"])
            .with("b.test", &["10.0.0.2"]),
    );
    let pinger = Arc::new(StubPinger::default());
    let progress = Arc::new(CountingProgress::default());

    scan_with(resolver, pinger)
        .with_progress(progress.clone())
        .run(&targets(&["a.test", "b.test", "c.test"]))
        .await
        .unwrap();

    assert_eq!(progress.resolve_total.load(Ordering::SeqCst), 3);
    assert_eq!(progress.resolve_done.load(Ordering::SeqCst), 3);
    assert_eq!(progress.probe_total.load(Ordering::SeqCst), 2);
    assert_eq!(progress.probe_done.load(Ordering::SeqCst), 2);
    assert_eq!(progress.finished.load(Ordering::SeqCst), 2);
}
