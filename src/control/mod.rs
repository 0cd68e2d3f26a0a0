//! This module provides the commands of the control utility, similar to systemctl from systemd.
//! Every command that names a unit takes a name fragment. The first unit file (ordered by name)
//! whose file name contains the fragment is used.
//!
//! ### daemon-reload
//! Accepted for compatibility. Unit files are read on every invocation so there is nothing
//! to reload.
//!
//! ### start name
//! Start the service as a detached process and record its pid in the service's pid marker.
//! Returns as soon as the process is forked.
//!
//! ### stop name
//! Send SIGTERM to the pid in the pid marker and remove the marker.
//!
//! ### restart / status / enable name
//! Not implemented. The unit is looked up and validated, then the command is acknowledged without
//! changing anything.

mod control;

pub use control::*;
