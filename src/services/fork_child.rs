use super::start_service::ExecPlan;
use super::ChildFailure;
use crate::platform;
use nix::fcntl::OFlag;
use nix::sys::stat::Mode;

// DO NOT USE THE LOGGER HERE. It aquires a global lock which might be held at the time of forking.
// Same goes for the allocator, everything needed was prepared in the ExecPlan.

fn fail(failure: ChildFailure, msg: &[u8], err: nix::Error) -> ! {
    platform::write_stderr(b"[FORK_CHILD] ");
    platform::write_stderr(msg);
    platform::write_stderr(b": ");
    platform::write_stderr(err.desc().as_bytes());
    platform::write_stderr(b"\n");
    platform::exit_immediately(failure.exit_code());
}

/// Overwrite the marker with our own pid. Not being able to write it does not stop the service.
fn write_pid_marker(plan: &ExecPlan) {
    let flags = OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC | OFlag::O_CLOEXEC;
    let mode = Mode::from_bits_truncate(0o644);
    match nix::fcntl::open(plan.marker_path.as_c_str(), flags, mode) {
        Ok(fd) => {
            let mut buf = [0u8; platform::PID_BUF_LEN];
            let pid = platform::format_pid(nix::unistd::getpid().as_raw(), &mut buf);
            platform::write_raw(fd, pid);
            let _ = nix::unistd::close(fd);
        }
        Err(e) => {
            platform::write_stderr(b"[FORK_CHILD] Could not open pid marker: ");
            platform::write_stderr(e.desc().as_bytes());
            platform::write_stderr(b"\n");
        }
    }
}

pub fn after_fork_child(plan: &ExecPlan) -> ! {
    // leave the session of the invoking terminal so the service outlives it
    if let Err(e) = nix::unistd::setsid() {
        fail(ChildFailure::Detach, b"setsid failed", e);
    }

    write_pid_marker(plan);

    if let Err(e) = nix::unistd::chdir(plan.working_directory.as_c_str()) {
        fail(ChildFailure::Chdir, b"chdir failed", e);
    }

    unsafe {
        libc::execve(
            plan.cmd.as_ptr(),
            plan.argv_ptrs.as_ptr(),
            plan.envp_ptrs.as_ptr(),
        );
    }
    // execve only returns on error
    fail(ChildFailure::Exec, b"execve failed", nix::errno::Errno::last());
}
