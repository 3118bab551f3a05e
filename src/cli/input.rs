//! Keystroke polling for the live panel using crossterm
//!
//! Features:
//! - Non-blocking poll between replay ticks
//! - Esc / Ctrl+C abort, `r` restart

use crossterm::event::{self, KeyCode, KeyEvent, KeyModifiers};
use std::io::Result as IoResult;
use std::time::Duration;

/// What the operator asked for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Abort,
    Restart,
}

/// Handles operator input from the terminal
pub struct InputHandler {
    /// Timeout for poll operations
    poll_timeout: Duration,
}

impl InputHandler {
    /// Zero timeout: the replay loop sets the pace
    pub fn new() -> Self {
        InputHandler {
            poll_timeout: Duration::ZERO,
        }
    }

    /// Poll for a pending keystroke without blocking
    pub fn read_key(&self) -> IoResult<Option<KeyEvent>> {
        if event::poll(self.poll_timeout)? {
            match event::read()? {
                event::Event::Key(key_event) => Ok(Some(key_event)),
                _ => Ok(None),
            }
        } else {
            Ok(None)
        }
    }

    /// Drain pending keystrokes, returning the first command found
    pub fn poll_command(&self) -> IoResult<Option<Command>> {
        while let Some(key) = self.read_key()? {
            if let Some(command) = Self::command(&key) {
                return Ok(Some(command));
            }
        }
        Ok(None)
    }

    pub fn command(key: &KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Command::Abort)
            }
            KeyCode::Esc => Some(Command::Abort),
            KeyCode::Char('r') => Some(Command::Restart),
            _ => None,
        }
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}
