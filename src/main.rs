use std::process;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

mod command;
mod config;
mod editor;
mod error;
mod history;
mod jobs;
mod launcher;
mod pipes;
mod prompt;
mod redirects;
mod shell;
mod signal_handler;
mod tokenizer;
mod variables;

use config::Config;

fn print_version() {
    println!("musash v{}", env!("CARGO_PKG_VERSION"));
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_env(config::LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    if config.version {
        print_version();
        return Ok(());
    }

    init_logging();

    signal_handler::ignore_interrupts().context("failed to ignore SIGINT")?;
    let mut shell = shell::Shell::new(config).context("failed to install SIGCHLD handler")?;
    let mut input = editor::Input::from_stdin();

    let code = shell.run(&mut input).context("shell terminated")?;
    process::exit(code);
}
