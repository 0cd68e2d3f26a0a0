//! psysd is a minimal service manager. It reads systemd-like unit files and starts the described
//! service as a detached process or stops it again.
//!
//! There is no daemon. Every invocation of the control utility looks up the unit file, parses it
//! and either forks the service or signals it. The only state that survives an invocation is the
//! pid marker file of a started service.
//!
//! What is explicitly in scope of this project
//! 1. Finding unit files by a fragment of their name
//! 1. Checking that a unit file has the [Unit], [Service] and [Install] sections
//! 1. WorkingDirectory=, ExecStart= (command plus at most one argument) and Environment=
//!    (one KEY=VALUE)
//! 1. Starting a service in its own session and stopping it with SIGTERM
//!
//! What is explicitly out of scope:
//! 1. Restart and status (accepted but not implemented)
//! 1. Dependencies between units
//! 1. Restarting crashed services, resource limits, capturing the output of services
pub mod config;
pub mod control;
pub mod entrypoints;
pub mod logging;
pub mod platform;
pub mod services;
pub mod units;

pub use entrypoints::*;

#[cfg(test)]
mod tests;
