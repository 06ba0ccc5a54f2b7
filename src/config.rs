use std::env;
use std::path::PathBuf;

use argh::FromArgs;

pub const DEFAULT_PROMPT: &str = "musash:- ";
pub const HISTORY_FILE_NAME: &str = ".musash_history";
pub const LOG_ENV: &str = "MUSASH_LOG";

/// musash - a small interactive command interpreter
#[derive(FromArgs, Debug)]
pub struct Config {
    /// text shown after the user@host:cwd part of the prompt
    #[argh(option, default = "DEFAULT_PROMPT.to_string()")]
    pub prompt: String,

    /// maximum number of words in one command, 0 for no limit
    #[argh(option, default = "10")]
    pub max_args: usize,

    /// maximum number of tracked background jobs
    #[argh(option, default = "10")]
    pub max_jobs: usize,

    /// number of commands kept in history
    #[argh(option, default = "10")]
    pub history_size: usize,

    /// history file (defaults to $HOME/.musash_history)
    #[argh(option)]
    pub history_file: Option<PathBuf>,

    /// keep history in memory only
    #[argh(switch)]
    pub no_history_file: bool,

    /// print version and exit
    #[argh(switch, short = 'V')]
    pub version: bool,
}

impl Config {
    pub fn from_env() -> Self {
        argh::from_env()
    }

    pub fn word_limit(&self) -> Option<usize> {
        (self.max_args > 0).then_some(self.max_args)
    }

    pub fn history_path(&self) -> Option<PathBuf> {
        if self.no_history_file {
            return None;
        }
        self.history_file.clone().or_else(|| {
            env::var_os("HOME").map(|home| PathBuf::from(home).join(HISTORY_FILE_NAME))
        })
    }
}
