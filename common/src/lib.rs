//! Shared types for `vpnprobe`: scan configuration, target naming and the
//! logging macros used across the workspace.

pub mod config;
pub mod macros;
pub mod target;

#[doc(hidden)]
pub use tracing as __tracing;
