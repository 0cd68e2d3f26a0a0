use super::{PidMarker, ServiceError};
use crate::config::Config;
use log::trace;
use nix::sys::signal::Signal;
use nix::unistd::Pid;

/// Send SIGTERM to the pid recorded in the service's marker and remove the marker.
///
/// There is no check whether the process actually terminated. If the signal can not be
/// delivered the marker is left in place.
pub fn stop_service(name: &str, config: &Config) -> Result<Pid, ServiceError> {
    let marker = PidMarker::for_service(config, name);
    let pid = marker.read()?;
    trace!("Stop service {} with pid {}", name, pid);

    nix::sys::signal::kill(pid, Signal::SIGTERM)
        .map_err(|e| ServiceError::SignalDelivery(pid, e))?;
    trace!("Sent SIGTERM to service {} (pid {})", name, pid);

    marker.remove()?;
    Ok(pid)
}
