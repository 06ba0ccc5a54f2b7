use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use nix::errno::Errno;
use nix::sys::signal::{self, SigHandler, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use signal_hook::consts::SIGCHLD;
use tracing::{debug, warn};

use crate::launcher;

/// Collects exited children on behalf of the main loop.
///
/// The SIGCHLD handler only raises a flag; all reaping happens in
/// [`ChildReaper::drain`], called from the main loop between prompts.
pub struct ChildReaper {
    pending: Arc<AtomicBool>,
}

impl ChildReaper {
    pub fn install() -> io::Result<Self> {
        let pending = Arc::new(AtomicBool::new(false));
        signal_hook::flag::register(SIGCHLD, Arc::clone(&pending))?;
        Ok(ChildReaper { pending })
    }

    /// Reap every child that has already exited, without blocking. One
    /// notification may stand for several exits.
    pub fn drain(&self) -> Vec<(Pid, i32)> {
        if !self.pending.swap(false, Ordering::AcqRel) {
            return Vec::new();
        }

        let mut reaped = Vec::new();
        loop {
            match waitpid(None, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) => break,
                Ok(status) => {
                    if let (Some(pid), Some(code)) = (status.pid(), launcher::exit_code(status)) {
                        debug!(pid = pid.as_raw(), code, "reaped child");
                        reaped.push((pid, code));
                    }
                }
                Err(Errno::EINTR) => continue,
                Err(Errno::ECHILD) => break,
                Err(e) => {
                    warn!(error = %e, "waitpid failed while reaping");
                    break;
                }
            }
        }
        reaped
    }
}

/// The shell itself ignores Ctrl-C; children restore the default before exec.
pub fn ignore_interrupts() -> nix::Result<()> {
    // SAFETY: installs a disposition, no handler code runs.
    unsafe { signal::signal(Signal::SIGINT, SigHandler::SigIgn) }.map(drop)
}
