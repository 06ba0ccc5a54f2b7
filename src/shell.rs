use std::io::{self, ErrorKind, Write};

use tracing::{info, warn};

use crate::command::{Builtin, BuiltinContext, Flow};
use crate::config::Config;
use crate::editor::Input;
use crate::error::Result;
use crate::history::History;
use crate::jobs::JobManager;
use crate::launcher::{self, Launch, Wiring};
use crate::pipes::Pipeline;
use crate::prompt::Prompt;
use crate::signal_handler::ChildReaper;
use crate::tokenizer::tokenize;
use crate::variables::Variables;

/// How a trimmed, non-empty command line will be run.
#[derive(Debug, PartialEq, Eq)]
pub enum Dispatch<'a> {
    Builtin(Builtin),
    Pipeline(&'a str),
    Foreground(&'a str),
    Background(&'a str),
}

/// Strip a trailing `&` and the whitespace around it.
pub fn split_background(line: &str) -> (&str, bool) {
    let line = line.trim();
    match line.strip_suffix('&') {
        Some(rest) => (rest.trim(), true),
        None => (line, false),
    }
}

/// Built-ins win over everything, then a pipe delimiter, then a plain
/// external command. `None` for a blank line.
pub fn classify(line: &str, background: bool) -> Result<Option<Dispatch<'_>>> {
    let Some(args) = tokenize(line, None)? else {
        return Ok(None);
    };
    if let Some(builtin) = Builtin::parse(&args) {
        return Ok(Some(Dispatch::Builtin(builtin)));
    }
    let dispatch = if line.contains('|') {
        Dispatch::Pipeline(line)
    } else if background {
        Dispatch::Background(line)
    } else {
        Dispatch::Foreground(line)
    };
    Ok(Some(dispatch))
}

pub struct Shell {
    config: Config,
    prompt: Prompt,
    history: History,
    variables: Variables,
    job_manager: JobManager,
    reaper: ChildReaper,
}

impl Shell {
    pub fn new(config: Config) -> io::Result<Self> {
        let reaper = ChildReaper::install()?;
        Ok(Self {
            prompt: Prompt::new(&config.prompt),
            history: History::new(config.history_size, config.history_path()),
            variables: Variables::new(),
            job_manager: JobManager::new(config.max_jobs),
            reaper,
            config,
        })
    }

    /// Prompt loop. Returns the exit status for the process; only a fatal
    /// error escapes as `Err`.
    pub fn run(&mut self, input: &mut Input) -> Result<i32> {
        loop {
            self.report_finished_jobs();

            let prompt = if input.is_interactive() {
                self.prompt.get_string()
            } else {
                String::new()
            };

            let line = match input.read_line(&prompt, &mut self.history) {
                Ok(Some(line)) => line,
                Ok(None) => {
                    if input.is_interactive() {
                        println!();
                    }
                    return Ok(0);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };

            match self.handle_line(&line) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit(code)) => return Ok(code),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => eprintln!("musash: {}", e),
            }
            let _ = io::stdout().flush();
        }
    }

    /// History replay, variable assignment and expansion, then execution.
    pub fn handle_line(&mut self, raw: &str) -> Result<Flow> {
        let mut line = raw.trim().to_string();
        if line.is_empty() {
            return Ok(Flow::Continue);
        }

        match self.history.resolve(&line)? {
            Some(replayed) => {
                println!("Repeating command: {}", replayed);
                line = replayed;
            }
            None => self.history.add(&line),
        }

        if self.variables.try_assign(&line) {
            return Ok(Flow::Continue);
        }

        let line = self.variables.expand(&line);
        let (command, background) = split_background(&line);
        self.execute(command, background)
    }

    /// Run one trimmed command line.
    pub fn execute(&mut self, line: &str, background: bool) -> Result<Flow> {
        self.report_finished_jobs();

        let Some(dispatch) = classify(line, background)? else {
            return Ok(Flow::Continue);
        };

        match dispatch {
            Dispatch::Builtin(builtin) => {
                let ctx = BuiltinContext {
                    jobs: &self.job_manager,
                    history: &self.history,
                    variables: &self.variables,
                };
                let mut stdout = io::stdout().lock();
                Ok(builtin.execute(&ctx, &mut stdout)?)
            }
            Dispatch::Pipeline(line) => {
                if background {
                    warn!("background marker ignored, pipelines always run in the foreground");
                }
                let code = Pipeline::parse(line, self.config.word_limit())?.run()?;
                println!("child exited with status {}", code);
                Ok(Flow::Continue)
            }
            Dispatch::Foreground(line) => {
                let Some(launch) = Launch::prepare(line, self.config.word_limit())? else {
                    return Ok(Flow::Continue);
                };
                let pid = launch.spawn(Wiring::Inherit)?;
                let code = launcher::wait_for(pid)?;
                println!("child exited with status {}", code);
                Ok(Flow::Continue)
            }
            Dispatch::Background(line) => {
                let Some(launch) = Launch::prepare(line, self.config.word_limit())? else {
                    return Ok(Flow::Continue);
                };
                let pid = launch.spawn(Wiring::Inherit)?;
                self.job_manager.register(pid, line)?;
                let number = self.job_manager.number_of(pid).unwrap_or_default();
                info!(pid = pid.as_raw(), number, "background job started");
                println!("[{}] {}", number, pid);
                Ok(Flow::Continue)
            }
        }
    }

    /// Reap exited children and drop their jobs.
    fn report_finished_jobs(&mut self) {
        for (pid, code) in self.reaper.drain() {
            let Some(number) = self.job_manager.number_of(pid) else {
                continue;
            };
            if let Some(job) = self.job_manager.unregister(pid) {
                if code == 0 {
                    println!("[{}] Done  {}", number, job.command);
                } else {
                    println!("[{}] Exit {}  {}", number, code, job.command);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_ampersand_sets_background() {
        assert_eq!(split_background("sleep 5 &"), ("sleep 5", true));
        assert_eq!(split_background("sleep 5&  "), ("sleep 5", true));
        assert_eq!(split_background("sleep 5"), ("sleep 5", false));
        assert_eq!(split_background("&"), ("", true));
    }

    #[test]
    fn builtins_take_precedence() {
        assert_eq!(
            classify("jobs", false).unwrap(),
            Some(Dispatch::Builtin(Builtin::Jobs))
        );
        assert_eq!(
            classify("cd /tmp | cat", false).unwrap(),
            Some(Dispatch::Builtin(Builtin::Cd(Some("/tmp".into()))))
        );
    }

    #[test]
    fn pipe_routes_to_pipeline_even_in_background() {
        assert_eq!(
            classify("ls | wc", true).unwrap(),
            Some(Dispatch::Pipeline("ls | wc"))
        );
    }

    #[test]
    fn external_commands_follow_background_flag() {
        assert_eq!(
            classify("sleep 5", true).unwrap(),
            Some(Dispatch::Background("sleep 5"))
        );
        assert_eq!(
            classify("ls -l", false).unwrap(),
            Some(Dispatch::Foreground("ls -l"))
        );
    }

    #[test]
    fn blank_line_dispatches_nothing() {
        assert_eq!(classify("", true).unwrap(), None);
    }
}
