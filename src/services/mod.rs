//! All the different parts of service starting/stopping.
//! 1. Checking the service and preparing everything the child needs (in the parent)
//! 1. Forking
//! 1. setsid, pid marker, chdir and exec (in the child)
//! 1. signaling the pid from the marker on stop
mod fork_child;
mod kill_service;
mod pid_marker;
mod start_service;

pub use kill_service::stop_service;
pub use pid_marker::PidMarker;
pub use start_service::*;

use nix::unistd::Pid;
use std::path::PathBuf;

#[derive(Debug)]
pub enum ServiceError {
    MissingDirective(String, &'static str),
    Exec(String, String),
    Fork(nix::Error),
    MarkerExists(PathBuf),
    MarkerWrite(PathBuf, std::io::Error),
    PidMarkerMissing(String),
    MarkerRead(PathBuf, std::io::Error),
    InvalidPidMarker(PathBuf, String),
    SignalDelivery(Pid, nix::Error),
    MarkerDelete(PathBuf, std::io::Error),
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ServiceError::MissingDirective(name, directive) => write!(
                f,
                "Service {} is missing the required directive {}",
                name, directive
            ),
            ServiceError::Exec(name, reason) => {
                write!(f, "Service {} can not be executed: {}", name, reason)
            }
            ServiceError::Fork(e) => write!(f, "fork failed: {}", e),
            ServiceError::MarkerExists(path) => write!(
                f,
                "Pid marker {:?} already exists, the service seems to be running",
                path
            ),
            ServiceError::MarkerWrite(path, e) => {
                write!(f, "Could not create pid marker {:?}: {}", path, e)
            }
            ServiceError::PidMarkerMissing(name) => {
                write!(f, "Service {} is not running or unknown", name)
            }
            ServiceError::MarkerRead(path, e) => {
                write!(f, "Could not read pid marker {:?}: {}", path, e)
            }
            ServiceError::InvalidPidMarker(path, content) => write!(
                f,
                "Pid marker {:?} does not contain a valid pid: {:?}",
                path, content
            ),
            ServiceError::SignalDelivery(pid, e) => write!(f, "kill {} failed: {}", pid, e),
            ServiceError::MarkerDelete(path, e) => {
                write!(f, "Could not remove pid marker {:?}: {}", path, e)
            }
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServiceError::MarkerWrite(_, e)
            | ServiceError::MarkerRead(_, e)
            | ServiceError::MarkerDelete(_, e) => Some(e),
            ServiceError::Fork(e) | ServiceError::SignalDelivery(_, e) => Some(e),
            _ => None,
        }
    }
}

/// Failures of the forked child. Nobody is there to report them to, they only show up
/// as the exit code of the child.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChildFailure {
    Detach,
    Chdir,
    Exec,
}

impl ChildFailure {
    pub fn exit_code(self) -> i32 {
        match self {
            ChildFailure::Detach => 2,
            ChildFailure::Chdir => 3,
            ChildFailure::Exec => 4,
        }
    }

    /// Used by tests to tell why a child exited
    #[cfg(test)]
    pub fn from_exit_code(code: i32) -> Option<ChildFailure> {
        match code {
            2 => Some(ChildFailure::Detach),
            3 => Some(ChildFailure::Chdir),
            4 => Some(ChildFailure::Exec),
            _ => None,
        }
    }
}
