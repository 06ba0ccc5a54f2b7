use std::env;

use colored::Colorize;

pub struct Prompt {
    prefix: String,
    user: String,
    host: String,
}

impl Prompt {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            user: whoami::username(),
            host: whoami::fallible::hostname().unwrap_or_else(|_| String::from("localhost")),
        }
    }

    pub fn get_string(&self) -> String {
        let cwd = env::current_dir()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| String::from("?"));

        format!(
            "{}:{} {}",
            format!("{}@{}", self.user, self.host).green().bold(),
            cwd.blue().bold(),
            self.prefix
        )
    }
}
