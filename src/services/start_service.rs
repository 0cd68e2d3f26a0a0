use super::fork_child;
use super::{PidMarker, ServiceError};
use crate::config::Config;
use crate::units::Service;
use log::{trace, warn};
use nix::errno::Errno;
use nix::unistd::Pid;
use std::ffi::{CString, OsStr, OsString};
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;

/// Everything the child needs between fork and exec, prepared by the parent.
/// The child must not allocate so all strings and the argv/envp pointer arrays live in here.
pub struct ExecPlan {
    pub(super) marker_path: CString,
    pub(super) working_directory: CString,
    pub(super) cmd: CString,
    // the pointer arrays point into these
    _argv: Vec<CString>,
    _envp: Vec<CString>,
    pub(super) argv_ptrs: Vec<*const libc::c_char>,
    pub(super) envp_ptrs: Vec<*const libc::c_char>,
}

fn to_cstring(name: &str, what: &str, bytes: &[u8]) -> Result<CString, ServiceError> {
    CString::new(bytes).map_err(|_| {
        ServiceError::Exec(
            name.to_owned(),
            format!("{} contains a nul byte: {:?}", what, String::from_utf8_lossy(bytes)),
        )
    })
}

fn null_terminated(strings: &[CString]) -> Vec<*const libc::c_char> {
    let mut ptrs: Vec<_> = strings.iter().map(|s| s.as_ptr()).collect();
    ptrs.push(std::ptr::null());
    ptrs
}

/// Same lookup rules as execvp: a cmd containing a '/' is used as is (relative to the
/// new working directory), a bare name is searched in PATH.
fn resolve_cmd(
    srvc: &Service,
    cmd: &str,
    working_directory: &str,
    path_var: Option<OsString>,
) -> Result<PathBuf, ServiceError> {
    if cmd.contains('/') {
        return Ok(PathBuf::from(cmd));
    }
    let path_var = path_var.or_else(|| std::env::var_os("PATH"));
    which::which_in(cmd, path_var, working_directory).map_err(|e| {
        ServiceError::Exec(
            srvc.name.clone(),
            format!("could not find executable {:?} in PATH: {}", cmd, e),
        )
    })
}

/// The environment of this process plus the one KEY=VALUE from the unit, which replaces an
/// inherited variable of the same name.
fn build_env(srvc: &Service) -> Result<Vec<CString>, ServiceError> {
    let unit_env = match (&srvc.environment, srvc.environment_pair()) {
        (Some(raw), None) => {
            warn!(
                "Service {}: ignoring Environment={} because it is not of the form KEY=VALUE",
                srvc.name, raw
            );
            None
        }
        (_, pair) => pair,
    };

    let mut env = Vec::new();
    for (key, value) in std::env::vars_os() {
        if let Some((unit_key, _)) = unit_env {
            if key.as_bytes() == unit_key.as_bytes() {
                continue;
            }
        }
        let mut entry = key.as_bytes().to_vec();
        entry.push(b'=');
        entry.extend_from_slice(value.as_bytes());
        env.push(to_cstring(&srvc.name, "environment", &entry)?);
    }
    if let Some((key, value)) = unit_env {
        trace!("Service {}: set environment variable {}", srvc.name, key);
        env.push(to_cstring(
            &srvc.name,
            "Environment",
            format!("{}={}", key, value).as_bytes(),
        )?);
    }
    Ok(env)
}

/// Check the service for required directives and prepare everything for the child
pub fn prepare_exec(srvc: &Service, marker: &PidMarker) -> Result<ExecPlan, ServiceError> {
    let (working_directory, exec_start) = match (&srvc.working_directory, &srvc.exec_start) {
        (Some(dir), Some(cmd)) => (dir, cmd),
        (None, _) => {
            return Err(ServiceError::MissingDirective(
                srvc.name.clone(),
                "WorkingDirectory",
            ))
        }
        (_, None) => {
            return Err(ServiceError::MissingDirective(
                srvc.name.clone(),
                "ExecStart",
            ))
        }
    };

    let path_override = match srvc.environment_pair() {
        Some(("PATH", value)) => Some(OsStr::new(value).to_os_string()),
        _ => None,
    };
    let resolved = resolve_cmd(srvc, exec_start, working_directory, path_override)?;
    trace!("Service {} will exec {:?}", srvc.name, resolved);

    let mut argv = vec![to_cstring(&srvc.name, "ExecStart", exec_start.as_bytes())?];
    match srvc.arguments.as_deref() {
        Some(arg) if !arg.is_empty() => {
            argv.push(to_cstring(&srvc.name, "argument", arg.as_bytes())?);
        }
        _ => {}
    }
    let envp = build_env(srvc)?;

    Ok(ExecPlan {
        marker_path: marker.c_path()?,
        working_directory: to_cstring(
            &srvc.name,
            "WorkingDirectory",
            working_directory.as_bytes(),
        )?,
        cmd: to_cstring(&srvc.name, "ExecStart", resolved.as_os_str().as_bytes())?,
        argv_ptrs: null_terminated(&argv),
        envp_ptrs: null_terminated(&envp),
        _argv: argv,
        _envp: envp,
    })
}

/// Reserve the marker. A marker whose process is gone (e.g. the child failed to chdir or exec)
/// is removed and reserved again, a marker of a live process keeps the service locked.
fn reserve_marker(marker: &PidMarker) -> Result<(), ServiceError> {
    match marker.reserve() {
        Err(ServiceError::MarkerExists(path)) => {
            let pid = match marker.read() {
                Ok(pid) => pid,
                // empty while another start has not forked yet, or garbage
                Err(_) => return Err(ServiceError::MarkerExists(path)),
            };
            match nix::sys::signal::kill(pid, None) {
                Err(Errno::ESRCH) => {
                    warn!(
                        "Pid marker {:?} names pid {} which does not exist anymore, reclaiming it",
                        path, pid
                    );
                    marker.remove()?;
                    marker.reserve()
                }
                _ => Err(ServiceError::MarkerExists(path)),
            }
        }
        other => other,
    }
}

/// Start the service as a detached process. Returns as soon as the child is forked, everything
/// the child does after that (setsid, writing the marker, chdir, exec) can fail without the
/// caller noticing.
pub fn start_service(srvc: &Service, config: &Config) -> Result<Pid, ServiceError> {
    let marker = PidMarker::for_service(config, &srvc.name);
    let plan = prepare_exec(srvc, &marker)?;

    if config.exclusive_markers {
        reserve_marker(&marker)?;
    } else if marker.exists() {
        warn!(
            "Pid marker {:?} exists and will be overwritten, the previous instance is not \
             tracked anymore",
            marker.path()
        );
    }

    match unsafe { nix::unistd::fork() } {
        Ok(nix::unistd::ForkResult::Parent { child }) => {
            trace!("Service {} forked with pid: {}", srvc.name, child);
            Ok(child)
        }
        Ok(nix::unistd::ForkResult::Child) => fork_child::after_fork_child(&plan),
        Err(e) => {
            if config.exclusive_markers {
                if let Err(remove_err) = marker.remove() {
                    warn!("Could not release reserved pid marker: {}", remove_err);
                }
            }
            Err(ServiceError::Fork(e))
        }
    }
}
