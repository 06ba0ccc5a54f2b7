use std::ffi::NulError;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ShellError>;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("too many arguments ({count} given, at most {max} allowed)")]
    TooManyArguments { count: usize, max: usize },

    #[error("invalid pipe command: expected exactly two commands around a single '|'")]
    InvalidPipelineShape,

    #[error("expected a file name after '{0}'")]
    MissingRedirectTarget(&'static str),

    #[error("missing command")]
    MissingCommand,

    #[error("{}: {source}", .path.display())]
    RedirectionTargetUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("job list is full ({capacity} jobs), process left untracked")]
    JobTableFull { capacity: usize },

    #[error("argument contains a NUL byte")]
    InvalidArgument(#[from] NulError),

    #[error("invalid history reference: {0}")]
    InvalidHistoryReference(String),

    #[error("fork failed: {0}")]
    Fork(#[source] nix::Error),

    #[error("pipe failed: {0}")]
    Pipe(#[source] nix::Error),

    #[error("wait failed: {0}")]
    Wait(#[source] nix::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ShellError {
    /// Process creation failure leaves no state to resume from.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ShellError::Fork(_))
    }
}
