use nix::unistd::Pid;
use tracing::{debug, warn};

use crate::error::{Result, ShellError};

/// A tracked background process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub pid: Pid,
    pub command: String,
    /// Monotonic registration number, never reused.
    pub seq: u64,
}

/// Background jobs in registration order. Only the coordinator mutates it,
/// reaped pids reach it through [`crate::signal_handler::ChildReaper`].
pub struct JobManager {
    jobs: Vec<Job>,
    capacity: usize,
    next_seq: u64,
}

impl JobManager {
    pub fn new(capacity: usize) -> Self {
        JobManager {
            jobs: Vec::with_capacity(capacity),
            capacity,
            next_seq: 1,
        }
    }

    /// Track `pid`. When the table is full the registration is dropped and
    /// the table is left untouched; the process keeps running untracked.
    pub fn register(&mut self, pid: Pid, command: impl Into<String>) -> Result<&Job> {
        if self.jobs.len() >= self.capacity {
            warn!(pid = pid.as_raw(), capacity = self.capacity, "job table full");
            return Err(ShellError::JobTableFull {
                capacity: self.capacity,
            });
        }

        let job = Job {
            pid,
            command: command.into(),
            seq: self.next_seq,
        };
        self.next_seq += 1;
        debug!(pid = pid.as_raw(), seq = job.seq, "job registered");
        self.jobs.push(job);
        Ok(&self.jobs[self.jobs.len() - 1])
    }

    /// Remove the job for `pid`, shifting later jobs down.
    pub fn unregister(&mut self, pid: Pid) -> Option<Job> {
        let index = self.jobs.iter().position(|job| job.pid == pid)?;
        Some(self.jobs.remove(index))
    }

    /// 1-based display number of the job for `pid`.
    pub fn number_of(&self, pid: Pid) -> Option<usize> {
        self.jobs.iter().position(|job| job.pid == pid).map(|i| i + 1)
    }

    pub fn list(&self) -> impl Iterator<Item = &Job> + '_ {
        self.jobs.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
