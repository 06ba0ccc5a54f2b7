use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;

use nix::unistd;

use crate::error::{Result, ShellError};
use crate::tokenizer::ArgVector;

const OUTPUT_MODE: u32 = 0o644;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectType {
    StdinFrom(PathBuf),
    StdoutTo(PathBuf),
}

impl RedirectType {
    /// Open the target and bind it over the matching standard stream of the
    /// calling process. Only call this in a freshly forked child.
    pub fn apply(&self) -> Result<()> {
        match self {
            RedirectType::StdinFrom(path) => {
                let file = File::open(path).map_err(|source| {
                    ShellError::RedirectionTargetUnavailable {
                        path: path.clone(),
                        source,
                    }
                })?;
                unistd::dup2_stdin(&file).map_err(|e| self.unavailable(e))?;
            }
            RedirectType::StdoutTo(path) => {
                let file = OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .mode(OUTPUT_MODE)
                    .open(path)
                    .map_err(|source| ShellError::RedirectionTargetUnavailable {
                        path: path.clone(),
                        source,
                    })?;
                unistd::dup2_stdout(&file).map_err(|e| self.unavailable(e))?;
            }
        }
        Ok(())
    }

    fn unavailable(&self, errno: nix::Error) -> ShellError {
        let path = match self {
            RedirectType::StdinFrom(path) | RedirectType::StdoutTo(path) => path.clone(),
        };
        ShellError::RedirectionTargetUnavailable {
            path,
            source: errno.into(),
        }
    }
}

/// A command with its `<` and `>` operators pulled out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub args: ArgVector,
    pub redirects: Vec<RedirectType>,
}

impl ParsedCommand {
    /// Scan left to right, removing each operator together with the path that
    /// follows it. Redirects keep their encounter order.
    pub fn parse(args: ArgVector) -> Result<Self> {
        let mut words = args.into_words().into_iter();
        let mut redirects = Vec::new();
        let mut cmd_parts = Vec::new();

        while let Some(word) = words.next() {
            match word.as_str() {
                "<" => {
                    let path = words.next().ok_or(ShellError::MissingRedirectTarget("<"))?;
                    redirects.push(RedirectType::StdinFrom(PathBuf::from(path)));
                }
                ">" => {
                    let path = words.next().ok_or(ShellError::MissingRedirectTarget(">"))?;
                    redirects.push(RedirectType::StdoutTo(PathBuf::from(path)));
                }
                _ => cmd_parts.push(word),
            }
        }

        let args = ArgVector::from_words(cmd_parts).ok_or(ShellError::MissingCommand)?;
        Ok(ParsedCommand { args, redirects })
    }

    /// Apply every redirect in order. Child side only.
    pub fn apply_redirects(&self) -> Result<()> {
        for redirect in &self.redirects {
            redirect.apply()?;
        }
        Ok(())
    }
}
