use std::io::Write;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use crossterm::cursor::MoveToColumn;
use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType};
use tracing::debug;

use crate::classify::EmotionLabel;

/// Build the single-line overlay shown under the capture loop.
pub fn format_status(
    label: Option<EmotionLabel>,
    playing: Option<&Path>,
    frames: u64,
) -> String {
    let emotion = match label {
        Some(label) => format!("Emotion: {}", label),
        None => "Emotion: Detecting...".to_string(),
    };
    let track = playing
        .and_then(|p| p.file_name())
        .map(|name| format!("  [playing {}]", name.to_string_lossy()))
        .unwrap_or_default();
    format!("{}{}  (frame {})", emotion, track, frames)
}

/// Terminal status line with a polled quit key.
///
/// Raw mode is enabled so single keypresses arrive unbuffered; the Drop guard
/// restores the terminal even on early exit. When stdin is not a terminal the
/// UI degrades to plain line output and the quit key is unavailable.
pub struct TerminalUi {
    raw_mode: bool,
}

impl TerminalUi {
    pub fn new() -> Self {
        let raw_mode = terminal::enable_raw_mode().is_ok();
        if !raw_mode {
            debug!("Raw mode unavailable, quit key disabled");
        }
        Self { raw_mode }
    }

    /// Redraw the status line in place.
    pub fn render(&mut self, line: &str) -> Result<()> {
        let mut stdout = std::io::stdout();
        if self.raw_mode {
            crossterm::execute!(
                stdout,
                MoveToColumn(0),
                Clear(ClearType::CurrentLine),
                Print(line)
            )?;
        } else {
            writeln!(stdout, "{}", line)?;
        }
        stdout.flush()?;
        Ok(())
    }

    /// Non-blocking check for the quit key: 'q', or Ctrl+C while raw mode
    /// swallows the signal.
    pub fn poll_quit(&self) -> bool {
        if !self.raw_mode {
            return false;
        }
        while event::poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Char('Q') => return true,
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        return true
                    }
                    _ => {}
                }
            }
        }
        false
    }
}

impl Drop for TerminalUi {
    fn drop(&mut self) {
        if self.raw_mode {
            let _ = terminal::disable_raw_mode();
            println!();
        }
    }
}
