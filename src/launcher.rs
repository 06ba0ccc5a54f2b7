use std::ffi::CString;
use std::os::fd::OwnedFd;

use nix::errno::Errno;
use nix::sys::signal::{self, SigHandler, Signal};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{self, ForkResult, Pid};
use tracing::{debug, warn};

use crate::error::{Result, ShellError};
use crate::redirects::ParsedCommand;
use crate::tokenizer::tokenize;

const EXIT_REDIRECT_FAILED: i32 = 1;
const EXIT_EXEC_FAILED: i32 = 127;

/// How a child's standard streams are wired before redirects are applied.
#[derive(Debug)]
pub enum Wiring {
    Inherit,
    StdoutTo(OwnedFd),
    StdinFrom(OwnedFd),
}

/// A command ready to be forked: redirects extracted and argv converted
/// up front so the child does as little as possible before exec.
#[derive(Debug)]
pub struct Launch {
    pub command: ParsedCommand,
    argv: Vec<CString>,
}

impl Launch {
    /// `Ok(None)` for a blank command.
    pub fn prepare(line: &str, max_args: Option<usize>) -> Result<Option<Self>> {
        let args = match tokenize(line, max_args)? {
            Some(args) => args,
            None => return Ok(None),
        };
        Self::from_command(ParsedCommand::parse(args)?).map(Some)
    }

    pub fn from_command(command: ParsedCommand) -> Result<Self> {
        let argv = command
            .args
            .words()
            .iter()
            .map(|word| CString::new(word.as_bytes()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { command, argv })
    }

    pub fn program(&self) -> &str {
        self.command.args.program()
    }

    /// Fork a child running this command. A fork failure is fatal to the
    /// caller; every failure after the fork stays inside the child.
    pub fn spawn(&self, wiring: Wiring) -> Result<Pid> {
        // SAFETY: the child only rebinds descriptors, resets a signal
        // disposition and calls exec or _exit.
        match unsafe { unistd::fork() } {
            Ok(ForkResult::Parent { child }) => {
                debug!(pid = child.as_raw(), program = self.program(), "spawned child");
                Ok(child)
            }
            Ok(ForkResult::Child) => self.exec_child(wiring),
            Err(e) => Err(ShellError::Fork(e)),
        }
    }

    fn exec_child(&self, wiring: Wiring) -> ! {
        // SAFETY: restoring the default disposition in a single-threaded child.
        let _ = unsafe { signal::signal(Signal::SIGINT, SigHandler::SigDfl) };

        let wired = match &wiring {
            Wiring::Inherit => Ok(()),
            Wiring::StdoutTo(fd) => unistd::dup2_stdout(fd),
            Wiring::StdinFrom(fd) => unistd::dup2_stdin(fd),
        };
        if let Err(e) = wired {
            eprintln!("{}: {}", self.program(), e);
            child_exit(EXIT_REDIRECT_FAILED);
        }
        drop(wiring);

        if let Err(e) = self.command.apply_redirects() {
            eprintln!("{}", e);
            child_exit(EXIT_REDIRECT_FAILED);
        }

        let err = match unistd::execvp(&self.argv[0], &self.argv) {
            Ok(never) => match never {},
            Err(e) => e,
        };
        if err == Errno::ENOENT {
            eprintln!("{}: command not found", self.program());
        } else {
            eprintln!("{}: {}", self.program(), err);
        }
        child_exit(EXIT_EXEC_FAILED)
    }
}

fn child_exit(code: i32) -> ! {
    // SAFETY: _exit skips the parent's atexit handlers and buffered stdio,
    // which the forked child must not run or flush twice.
    unsafe { libc::_exit(code) }
}

/// Block until `pid` exits and return its exit code. A signal death maps to
/// 128 plus the signal number.
pub fn wait_for(pid: Pid) -> Result<i32> {
    loop {
        match waitpid(pid, None) {
            Ok(status) => {
                if let Some(code) = exit_code(status) {
                    debug!(pid = pid.as_raw(), code, "child exited");
                    return Ok(code);
                }
            }
            Err(Errno::EINTR) => continue,
            Err(e) => {
                warn!(pid = pid.as_raw(), error = %e, "waitpid failed");
                return Err(ShellError::Wait(e));
            }
        }
    }
}

/// Decoded exit code for a terminal wait status.
pub fn exit_code(status: WaitStatus) -> Option<i32> {
    match status {
        WaitStatus::Exited(_, code) => Some(code),
        WaitStatus::Signaled(_, sig, _) => Some(128 + sig as i32),
        _ => None,
    }
}
