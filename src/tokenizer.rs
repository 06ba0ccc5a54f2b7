use crate::error::{Result, ShellError};

/// Program name followed by its arguments. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgVector(Vec<String>);

impl ArgVector {
    /// Returns `None` for an empty word list.
    pub fn from_words(words: Vec<String>) -> Option<Self> {
        if words.is_empty() {
            None
        } else {
            Some(Self(words))
        }
    }

    pub fn program(&self) -> &str {
        &self.0[0]
    }

    pub fn words(&self) -> &[String] {
        &self.0
    }

    pub fn into_words(self) -> Vec<String> {
        self.0
    }
}

/// Split a command into words on runs of spaces and tabs. No quoting or
/// escaping is recognised.
///
/// `Ok(None)` means there is nothing to run. `max_args` of `None` leaves the
/// word count unbounded.
pub fn tokenize(line: &str, max_args: Option<usize>) -> Result<Option<ArgVector>> {
    let words: Vec<String> = line
        .split([' ', '\t'])
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect();

    if let Some(max) = max_args {
        if words.len() > max {
            return Err(ShellError::TooManyArguments {
                count: words.len(),
                max,
            });
        }
    }

    Ok(ArgVector::from_words(words))
}
