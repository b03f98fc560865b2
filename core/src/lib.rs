//! Resolution, probing and reporting for `vpnprobe`.
//!
//! The pipeline is resolve → sort → probe → report:
//! * [`resolver`] turns domains into sorted address lists.
//! * [`prober`] decides reachability and gathers round-trip statistics.
//! * [`report`] renders the collected results.
//! * [`scanner`] wires the stages together with bounded concurrency.

pub mod pool;
pub mod prober;
pub mod report;
pub mod resolver;
pub mod scanner;
