mod core;
mod raw_mode;

use std::io::{self, BufRead, StdinLock};

use crossterm::tty::IsTty;

use self::core::LineEditor;
use crate::history::History;

/// Where command lines come from: the raw-mode editor on a terminal, plain
/// line reads otherwise.
pub enum Input {
    Terminal(LineEditor),
    Stream(StdinLock<'static>),
}

impl Input {
    pub fn from_stdin() -> Self {
        let stdin = io::stdin();
        if stdin.is_tty() {
            Input::Terminal(LineEditor::new())
        } else {
            Input::Stream(stdin.lock())
        }
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self, Input::Terminal(_))
    }

    /// Next line without its terminator, or `None` once input is exhausted.
    pub fn read_line(&mut self, prompt: &str, history: &mut History) -> io::Result<Option<String>> {
        match self {
            Input::Terminal(editor) => editor.read_line(prompt, history),
            Input::Stream(stdin) => read_stream_line(stdin),
        }
    }
}

/// Invalid UTF-8 is replaced rather than rejected so one bad line cannot end
/// the session.
fn read_stream_line(reader: &mut impl BufRead) -> io::Result<Option<String>> {
    let mut buf = Vec::new();
    if reader.read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }
    while matches!(buf.last(), Some(b'\n' | b'\r')) {
        buf.pop();
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}
