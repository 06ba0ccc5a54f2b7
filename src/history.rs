use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use tracing::warn;

use crate::error::{Result, ShellError};

/// Bounded command history, oldest entries dropped first.
pub struct History {
    commands: VecDeque<String>,
    capacity: usize,
    file_path: Option<PathBuf>,
    position: usize,
}

impl History {
    pub fn new(capacity: usize, file_path: Option<PathBuf>) -> Self {
        let mut history = Self {
            commands: VecDeque::with_capacity(capacity),
            capacity,
            file_path: None,
            position: 0,
        };
        if let Some(path) = &file_path {
            for command in Self::load_from_file(path) {
                history.push(command);
            }
        }
        history.file_path = file_path;
        history.position = history.commands.len();
        history
    }

    fn load_from_file(path: &PathBuf) -> Vec<String> {
        match File::open(path) {
            Ok(file) => BufReader::new(file)
                .lines()
                .map_while(|line| line.ok())
                .filter(|line| !line.trim().is_empty())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn add(&mut self, command: &str) {
        if command.trim().is_empty() {
            return;
        }
        self.push(command.to_string());
        self.save_to_file(command);
        self.position = self.commands.len();
    }

    fn push(&mut self, command: String) {
        if self.capacity == 0 {
            return;
        }
        if self.commands.len() == self.capacity {
            self.commands.pop_front();
        }
        self.commands.push_back(command);
    }

    fn save_to_file(&self, command: &str) {
        let Some(path) = &self.file_path else {
            return;
        };
        let written = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| writeln!(file, "{}", command));
        if let Err(e) = written {
            warn!(path = %path.display(), error = %e, "could not append to history file");
        }
    }

    /// Resolve a `!N` (1-based) or `!-1` (most recent) reference. Returns
    /// `Ok(None)` when `line` is not a history reference.
    pub fn resolve(&self, line: &str) -> Result<Option<String>> {
        let Some(reference) = line.strip_prefix('!') else {
            return Ok(None);
        };

        let index = if reference.starts_with('-') {
            self.commands.len().checked_sub(1)
        } else {
            reference
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
        };

        index
            .and_then(|i| self.commands.get(i))
            .cloned()
            .map(Some)
            .ok_or_else(|| ShellError::InvalidHistoryReference(line.to_string()))
    }

    pub fn previous(&mut self) -> Option<&String> {
        if self.position > 0 {
            self.position -= 1;
            self.commands.get(self.position)
        } else {
            None
        }
    }

    pub fn next(&mut self) -> Option<&String> {
        if self.position + 1 < self.commands.len() {
            self.position += 1;
            self.commands.get(self.position)
        } else {
            self.position = self.commands.len();
            None
        }
    }

    /// Forget any up/down navigation.
    pub fn reset_cursor(&mut self) {
        self.position = self.commands.len();
    }

    pub fn entries(&self) -> impl Iterator<Item = &String> + '_ {
        self.commands.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn entries(history: &History) -> Vec<&str> {
        history.entries().map(String::as_str).collect()
    }

    #[test]
    fn drops_oldest_when_full() {
        let mut history = History::new(3, None);
        for cmd in ["a", "b", "c", "d"] {
            history.add(cmd);
        }
        assert_eq!(entries(&history), ["b", "c", "d"]);
    }

    #[test]
    fn ignores_blank_lines() {
        let mut history = History::new(3, None);
        history.add("   ");
        assert_eq!(history.entries().count(), 0);
    }

    #[test]
    fn resolves_numbered_and_last_references() {
        let mut history = History::new(10, None);
        history.add("ls");
        history.add("pwd");

        assert_eq!(history.resolve("!1").unwrap().as_deref(), Some("ls"));
        assert_eq!(history.resolve("!2").unwrap().as_deref(), Some("pwd"));
        assert_eq!(history.resolve("!-1").unwrap().as_deref(), Some("pwd"));
        assert_eq!(history.resolve("ls -l").unwrap(), None);
    }

    #[test]
    fn rejects_out_of_range_references() {
        let mut history = History::new(10, None);
        assert!(history.resolve("!-1").is_err());
        history.add("ls");
        for reference in ["!0", "!2", "!x", "!"] {
            assert!(
                matches!(history.resolve(reference), Err(ShellError::InvalidHistoryReference(_))),
                "accepted {}",
                reference
            );
        }
    }

    #[test]
    fn navigation_walks_back_and_forth() {
        let mut history = History::new(10, None);
        history.add("one");
        history.add("two");

        assert_eq!(history.previous().map(String::as_str), Some("two"));
        assert_eq!(history.previous().map(String::as_str), Some("one"));
        assert_eq!(history.previous(), None);
        assert_eq!(history.next().map(String::as_str), Some("two"));
        assert_eq!(history.next(), None);
    }

    #[test]
    fn persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history");

        let mut history = History::new(2, Some(path.clone()));
        history.add("first");
        history.add("second");
        history.add("third");
        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\nthird\n");

        let reloaded = History::new(2, Some(path));
        assert_eq!(entries(&reloaded), ["second", "third"]);
    }
}
