use std::io;
use std::sync::Once;

use crossterm::terminal;

static RESTORE_ON_PANIC: Once = Once::new();

/// Keeps the terminal in raw mode while a line is being edited.
///
/// Dropping the guard restores cooked mode unless raw mode was already on
/// when it was entered. Children are only forked after the guard is gone.
pub struct RawModeGuard {
    restore: bool,
}

impl RawModeGuard {
    pub fn enter() -> io::Result<Self> {
        RESTORE_ON_PANIC.call_once(|| {
            let prev = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                let _ = terminal::disable_raw_mode();
                prev(info);
            }));
        });

        let already_raw = terminal::is_raw_mode_enabled()?;
        if !already_raw {
            terminal::enable_raw_mode()?;
        }
        Ok(Self {
            restore: !already_raw,
        })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if self.restore {
            let _ = terminal::disable_raw_mode();
        }
    }
}
