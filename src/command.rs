use std::env;
use std::io::{self, Write};

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

use crate::history::History;
use crate::jobs::JobManager;
use crate::tokenizer::ArgVector;
use crate::variables::Variables;

/// What the main loop does after a line has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit(i32),
}

#[derive(Debug, PartialEq, Eq)]
pub enum Builtin {
    Cd(Option<String>),
    Exit(Option<String>),
    Jobs,
    Kill(Option<String>),
    History,
    ListVars,
    PrintEnv,
    Help,
}

/// Shell state a built-in may read or change.
pub struct BuiltinContext<'a> {
    pub jobs: &'a JobManager,
    pub history: &'a History,
    pub variables: &'a Variables,
}

impl Builtin {
    pub fn parse(args: &ArgVector) -> Option<Self> {
        let first = args.words().get(1).cloned();
        let builtin = match args.program() {
            "cd" => Builtin::Cd(first),
            "exit" => Builtin::Exit(first),
            "jobs" => Builtin::Jobs,
            "kill" => Builtin::Kill(first),
            "history" => Builtin::History,
            "listvars" => Builtin::ListVars,
            "printenv" => Builtin::PrintEnv,
            "help" => Builtin::Help,
            _ => return None,
        };
        Some(builtin)
    }

    pub fn execute(&self, ctx: &BuiltinContext<'_>, out: &mut impl Write) -> io::Result<Flow> {
        match self {
            Builtin::Cd(path) => {
                let home = env::var("HOME").unwrap_or_else(|_| "/".to_string());
                let target = path.as_deref().unwrap_or(&home);
                if let Err(e) = env::set_current_dir(target) {
                    eprintln!("cd: {}: {}", target, e);
                }
            }

            Builtin::Exit(code) => {
                let code = match code.as_deref().map(str::parse::<i32>) {
                    None => 0,
                    Some(Ok(code)) => code,
                    Some(Err(_)) => {
                        eprintln!("exit: numeric argument required");
                        return Ok(Flow::Continue);
                    }
                };
                writeln!(out, "Exiting shell...")?;
                return Ok(Flow::Exit(code));
            }

            Builtin::Jobs => {
                if ctx.jobs.is_empty() {
                    writeln!(out, "No background jobs")?;
                }
                for (i, job) in ctx.jobs.list().enumerate() {
                    writeln!(out, "[{}] {} (PID: {})", i + 1, job.command, job.pid)?;
                }
            }

            Builtin::Kill(target) => {
                let Some(target) = target else {
                    eprintln!("kill: missing PID");
                    return Ok(Flow::Continue);
                };
                match target.parse::<i32>() {
                    Ok(raw) if raw > 0 => match signal::kill(Pid::from_raw(raw), Signal::SIGKILL) {
                        Ok(()) => writeln!(out, "Process {} killed.", raw)?,
                        Err(e) => eprintln!("kill: {}: {}", raw, e),
                    },
                    _ => eprintln!("kill: invalid PID: {}", target),
                }
            }

            Builtin::History => {
                for (i, cmd) in ctx.history.entries().enumerate() {
                    writeln!(out, "{}: {}", i + 1, cmd)?;
                }
            }

            Builtin::ListVars => {
                writeln!(out, "User-defined variables:")?;
                for (name, value) in ctx.variables.iter() {
                    writeln!(out, "{}={}", name, value)?;
                }
            }

            Builtin::PrintEnv => {
                for (name, value) in env::vars_os() {
                    writeln!(out, "{}={}", name.to_string_lossy(), value.to_string_lossy())?;
                }
            }

            Builtin::Help => {
                writeln!(out, "Available built-in commands:")?;
                writeln!(out, "  cd [dir]        - Change the working directory")?;
                writeln!(out, "  exit [code]     - Terminate the shell")?;
                writeln!(out, "  jobs            - List background processes")?;
                writeln!(out, "  kill <pid>      - Terminate a process by PID")?;
                writeln!(out, "  history         - Show recent commands (!N, !-1 to repeat)")?;
                writeln!(out, "  listvars        - Display user-defined variables")?;
                writeln!(out, "  printenv        - Display environment variables")?;
                writeln!(out, "  help            - Display this help message")?;
                writeln!(out)?;
                writeln!(out, "NAME=value assigns a variable, $NAME expands it.")?;
                writeln!(
                    out,
                    "Use '<' and '>' to redirect, 'a | b' to pipe, \
                     and a trailing '&' to run in background."
                )?;
            }
        }
        Ok(Flow::Continue)
    }
}
