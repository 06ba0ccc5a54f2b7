use nix::fcntl::OFlag;
use nix::unistd;
use tracing::debug;

use crate::error::{Result, ShellError};
use crate::launcher::{self, Launch, Wiring};

/// Two commands joined by a single `|`.
#[derive(Debug)]
pub struct Pipeline {
    pub left: Launch,
    pub right: Launch,
}

impl Pipeline {
    /// Split on the pipe delimiter and prepare both stages. Anything other
    /// than exactly two non-blank stages is rejected before a process exists.
    pub fn parse(line: &str, max_args: Option<usize>) -> Result<Self> {
        let stages: Vec<&str> = line.split('|').collect();
        let (left, right) = match stages.as_slice() {
            [left, right] => (*left, *right),
            _ => return Err(ShellError::InvalidPipelineShape),
        };

        let left = Launch::prepare(left, max_args)?.ok_or(ShellError::InvalidPipelineShape)?;
        let right = Launch::prepare(right, max_args)?.ok_or(ShellError::InvalidPipelineShape)?;
        Ok(Pipeline { left, right })
    }

    /// Run both stages and block until both have exited. Returns the right
    /// stage's exit code.
    pub fn run(&self) -> Result<i32> {
        // Close-on-exec keeps stray copies of either end out of the exec'd
        // programs; the dup'd standard streams are unaffected.
        let (read_end, write_end) = unistd::pipe2(OFlag::O_CLOEXEC).map_err(ShellError::Pipe)?;

        let left_pid = self.left.spawn(Wiring::StdoutTo(write_end))?;
        let right_pid = match self.right.spawn(Wiring::StdinFrom(read_end)) {
            Ok(pid) => pid,
            Err(e) => {
                // The read end is gone, so the left stage cannot block forever.
                let _ = launcher::wait_for(left_pid);
                return Err(e);
            }
        };
        debug!(
            left = left_pid.as_raw(),
            right = right_pid.as_raw(),
            "pipeline started"
        );

        join_stages(launcher::wait_for(left_pid), launcher::wait_for(right_pid))
    }
}

/// Both stages have been waited on by the time this runs; the first error
/// wins, otherwise the right stage's code.
fn join_stages(left: Result<i32>, right: Result<i32>) -> Result<i32> {
    left?;
    right
}
