use std::io::{self, Write};

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    style::Print,
    terminal::{self, ClearType},
};

use super::raw_mode::RawModeGuard;
use crate::history::History;

/// What a key press did to the line being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Submit,
    Cancel,
    Eof,
    Redraw,
    MoveCursor,
    ClearScreen,
    Ignored,
}

pub struct LineEditor {
    buffer: String,
    cursor_pos: usize,
}

impl LineEditor {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            cursor_pos: 0,
        }
    }

    /// Read one line. `Ok(None)` on Ctrl-D with an empty line.
    pub fn read_line(&mut self, prompt: &str, history: &mut History) -> io::Result<Option<String>> {
        self.buffer.clear();
        self.cursor_pos = 0;
        history.reset_cursor();

        let mut stdout = io::stdout();
        let _guard = RawModeGuard::enter()?;

        execute!(stdout, Print(prompt))?;
        stdout.flush()?;

        loop {
            let key = match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => key,
                _ => continue,
            };

            match self.handle_key(key, history) {
                KeyOutcome::Submit => {
                    execute!(stdout, Print("\r\n"))?;
                    return Ok(Some(self.buffer.clone()));
                }
                KeyOutcome::Cancel => {
                    execute!(stdout, Print("^C\r\n"))?;
                    return Ok(Some(String::new()));
                }
                KeyOutcome::Eof => {
                    execute!(stdout, Print("\r\n"))?;
                    return Ok(None);
                }
                KeyOutcome::Redraw => self.redraw(prompt)?,
                KeyOutcome::MoveCursor => self.update_cursor_position(prompt)?,
                KeyOutcome::ClearScreen => {
                    execute!(stdout, terminal::Clear(ClearType::All), cursor::MoveTo(0, 0))?;
                    self.redraw(prompt)?;
                }
                KeyOutcome::Ignored => {}
            }
        }
    }

    /// Apply a key to the buffer without touching the terminal.
    pub fn handle_key(&mut self, key: KeyEvent, history: &mut History) -> KeyOutcome {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let len = self.buffer.chars().count();

        match key.code {
            KeyCode::Enter => KeyOutcome::Submit,
            KeyCode::Char('c') if ctrl => KeyOutcome::Cancel,
            KeyCode::Char('d') if ctrl => {
                if self.buffer.is_empty() {
                    KeyOutcome::Eof
                } else {
                    self.delete_at_cursor()
                }
            }
            KeyCode::Char('l') if ctrl => KeyOutcome::ClearScreen,
            KeyCode::Char('a') if ctrl => self.move_to(0),
            KeyCode::Char('e') if ctrl => self.move_to(len),
            KeyCode::Char('k') if ctrl => {
                let end = self.byte_index_at_char_pos(self.cursor_pos);
                self.buffer.truncate(end);
                KeyOutcome::Redraw
            }
            KeyCode::Char('u') if ctrl => {
                let end = self.byte_index_at_char_pos(self.cursor_pos);
                self.buffer.drain(..end);
                self.cursor_pos = 0;
                KeyOutcome::Redraw
            }
            KeyCode::Char('w') if ctrl => self.delete_word_before_cursor(),
            KeyCode::Char(_) if ctrl => KeyOutcome::Ignored,
            KeyCode::Char(c) => {
                let at = self.byte_index_at_char_pos(self.cursor_pos);
                self.buffer.insert(at, c);
                self.cursor_pos += 1;
                KeyOutcome::Redraw
            }
            KeyCode::Tab => {
                let at = self.byte_index_at_char_pos(self.cursor_pos);
                self.buffer.insert(at, ' ');
                self.cursor_pos += 1;
                KeyOutcome::Redraw
            }
            KeyCode::Backspace if self.cursor_pos > 0 => {
                self.cursor_pos -= 1;
                let at = self.byte_index_at_char_pos(self.cursor_pos);
                self.buffer.remove(at);
                KeyOutcome::Redraw
            }
            KeyCode::Delete => self.delete_at_cursor(),
            KeyCode::Left if self.cursor_pos > 0 => self.move_to(self.cursor_pos - 1),
            KeyCode::Right if self.cursor_pos < len => self.move_to(self.cursor_pos + 1),
            KeyCode::Home => self.move_to(0),
            KeyCode::End => self.move_to(len),
            KeyCode::Up => match history.previous() {
                Some(entry) => {
                    let entry = entry.clone();
                    self.replace_buffer(entry)
                }
                None => KeyOutcome::Ignored,
            },
            KeyCode::Down => {
                let entry = history.next().cloned().unwrap_or_default();
                self.replace_buffer(entry)
            }
            _ => KeyOutcome::Ignored,
        }
    }

    #[cfg(test)]
    fn buffer(&self) -> &str {
        &self.buffer
    }

    fn move_to(&mut self, pos: usize) -> KeyOutcome {
        self.cursor_pos = pos;
        KeyOutcome::MoveCursor
    }

    fn replace_buffer(&mut self, contents: String) -> KeyOutcome {
        self.buffer = contents;
        self.cursor_pos = self.buffer.chars().count();
        KeyOutcome::Redraw
    }

    fn delete_at_cursor(&mut self) -> KeyOutcome {
        if self.cursor_pos >= self.buffer.chars().count() {
            return KeyOutcome::Ignored;
        }
        let at = self.byte_index_at_char_pos(self.cursor_pos);
        self.buffer.remove(at);
        KeyOutcome::Redraw
    }

    fn delete_word_before_cursor(&mut self) -> KeyOutcome {
        let chars: Vec<char> = self.buffer.chars().collect();
        let mut start = self.cursor_pos;
        while start > 0 && chars[start - 1].is_whitespace() {
            start -= 1;
        }
        while start > 0 && !chars[start - 1].is_whitespace() {
            start -= 1;
        }
        if start == self.cursor_pos {
            return KeyOutcome::Ignored;
        }

        let byte_start = self.byte_index_at_char_pos(start);
        let byte_end = self.byte_index_at_char_pos(self.cursor_pos);
        self.buffer.drain(byte_start..byte_end);
        self.cursor_pos = start;
        KeyOutcome::Redraw
    }

    fn redraw(&self, prompt: &str) -> io::Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::UntilNewLine),
            Print(prompt),
            Print(&self.buffer),
        )?;
        self.update_cursor_position(prompt)
    }

    fn update_cursor_position(&self, prompt: &str) -> io::Result<()> {
        let mut stdout = io::stdout();
        let column = visual_length(prompt) + self.cursor_pos;
        execute!(stdout, cursor::MoveToColumn(column as u16))?;
        stdout.flush()
    }

    fn byte_index_at_char_pos(&self, char_pos: usize) -> usize {
        self.buffer
            .char_indices()
            .nth(char_pos)
            .map(|(i, _)| i)
            .unwrap_or(self.buffer.len())
    }
}

/// Printed width of `s`, ignoring ANSI colour sequences.
fn visual_length(s: &str) -> usize {
    let mut in_escape = false;
    let mut length = 0;

    for c in s.chars() {
        if c == '\x1b' {
            in_escape = true;
        } else if in_escape {
            if c == 'm' {
                in_escape = false;
            }
        } else {
            length += 1;
        }
    }
    length
}
