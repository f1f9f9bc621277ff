use std::ffi::CString;
use std::io::{self, Write};
use std::os::unix::io::RawFd;

use log::{debug, error};
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{execvp, fork, ForkResult, Pid};

use crate::shell::status;

/// Runs `body` in a forked copy of the shell and blocks until it ends.
///
/// Descriptor changes made by `body` stay in the child. The child exits with
/// whatever `body` returns; the parent translates the wait status.
///
/// Only the single-threaded shell process calls this; unit tests leave it to
/// the end-to-end tests, which run one `minish` process each.
pub fn run_isolated<F>(body: F) -> i32
where
    F: FnOnce() -> i32,
{
    // buffered output would otherwise be written twice
    let _ = io::stdout().flush();
    let _ = io::stderr().flush();

    // SAFETY: the `minish` binary forks from its only thread. The child only
    // adjusts descriptors, runs a built-in or execs before calling `_exit`.
    // Callers in a multi-threaded process must not fork while another thread
    // may hold a lock the child needs (stdio, the logger).
    match unsafe { fork() } {
        Ok(ForkResult::Child) => {
            let code = body();
            // SAFETY: `_exit` skips the parent's atexit handlers, which is what
            // a forked child must do.
            unsafe { libc::_exit(code) }
        }
        Ok(ForkResult::Parent { child }) => {
            debug!("forked child {}", child);
            wait_child(child)
        }
        Err(errno) => {
            error!("fork failed: {}", errno);
            eprintln!("minish: fork: {}", errno.desc());
            status::FAILURE
        }
    }
}

/// Unbuffered writer on a raw descriptor.
///
/// Forked children write through this instead of the global stdout handle,
/// whose lock may have been held by another thread at fork time.
pub struct FdWriter(pub RawFd);

impl Write for FdWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // SAFETY: `buf` is valid for `buf.len()` bytes for the whole call.
        let written = unsafe { libc::write(self.0, buf.as_ptr().cast(), buf.len()) };
        if written < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(written as usize)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Waits for `pid` and maps its outcome onto a shell status.
pub fn wait_child(pid: Pid) -> i32 {
    loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => {
                debug!("child {} exited with {}", pid, code);
                return code;
            }
            Ok(WaitStatus::Signaled(_, signal, _core_dumped)) => {
                debug!("child {} killed by {}", pid, signal);
                return status::SIGNAL_BASE + signal as i32;
            }
            Ok(other) => {
                error!("unexpected wait status for {}: {:?}", pid, other);
                return status::FAILURE;
            }
            Err(Errno::EINTR) => continue,
            Err(errno) => {
                error!("waitpid {} failed: {}", pid, errno);
                eprintln!("minish: waitpid: {}", errno.desc());
                return status::FAILURE;
            }
        }
    }
}

/// Replaces the current (child) process image, searching `PATH`.
///
/// Only returns when the program could not be started, yielding the
/// not-found status after reporting why.
pub fn exec_program(argv: &[String]) -> i32 {
    let Some(name) = argv.first() else {
        eprintln!("minish: empty command");
        return status::NOT_FOUND;
    };

    let args: Result<Vec<CString>, _> = argv.iter().map(|arg| CString::new(arg.as_bytes())).collect();
    let args = match args {
        Ok(args) => args,
        Err(_) => {
            eprintln!("minish: {}: argument contains a NUL byte", name);
            return status::NOT_FOUND;
        }
    };

    let errno = match execvp(&args[0], &args) {
        Ok(never) => match never {},
        Err(errno) => errno,
    };
    if errno == Errno::ENOENT {
        eprintln!("minish: {}: command not found", name);
    } else {
        eprintln!("minish: {}: {}", name, errno.desc());
    }
    status::NOT_FOUND
}
