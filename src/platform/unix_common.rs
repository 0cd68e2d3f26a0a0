use std::os::unix::io::RawFd;

/// Enough room for the decimal representation of any i32
pub const PID_BUF_LEN: usize = 11;

/// Render a pid as decimal ascii into the provided buffer without allocating
pub fn format_pid(pid: i32, buf: &mut [u8; PID_BUF_LEN]) -> &[u8] {
    let mut value = pid.unsigned_abs();
    let mut pos = buf.len();
    loop {
        pos -= 1;
        buf[pos] = b'0' + (value % 10) as u8;
        value /= 10;
        if value == 0 {
            break;
        }
    }
    if pid < 0 {
        pos -= 1;
        buf[pos] = b'-';
    }
    &buf[pos..]
}

/// Write raw bytes to fd, ignoring short writes and errors
pub fn write_raw(fd: RawFd, msg: &[u8]) {
    unsafe {
        let _ = libc::write(fd, msg.as_ptr() as *const libc::c_void, msg.len());
    }
}

pub fn write_stderr(msg: &[u8]) {
    write_raw(libc::STDERR_FILENO, msg);
}

/// Leave the process without running atexit handlers or flushing the stdio buffers
/// that were inherited from the parent
pub fn exit_immediately(code: i32) -> ! {
    unsafe { libc::_exit(code) }
}
