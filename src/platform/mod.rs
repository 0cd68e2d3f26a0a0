//! This module should provide all platfrom specific code.
//! All calls to the libc:: crate should be encapsulated here.
//!
//! unix_common contains the helpers the forked child uses between fork() and exec().
//! Nothing in there may allocate or take a lock, the child of a multithreaded
//! parent can only rely on async-signal-safe calls.
//!
//! The location of the unit files is platform selected, see `default_unit_dir`.

mod unix_common;

pub use unix_common::*;

use std::path::PathBuf;

#[cfg(target_os = "macos")]
const SYSTEM_UNIT_PATH: &str = "/tmp/systemd";
#[cfg(not(target_os = "macos"))]
const SYSTEM_UNIT_PATH: &str = "/etc/systemd/system/";

/// Where unit files are looked up if nothing else was configured
pub fn default_unit_dir() -> PathBuf {
    PathBuf::from(SYSTEM_UNIT_PATH)
}
