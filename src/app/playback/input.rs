use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tracing::debug;

use super::KeyHandler;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Relays keypresses from the terminal to the player on a background thread
/// for as long as it is alive.
pub(crate) struct KeyRelay {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl KeyRelay {
    /// `Ok(None)` when stdin is not a terminal.
    pub(crate) fn start(mut handler: KeyHandler) -> Result<Option<Self>> {
        if !io::stdin().is_terminal() {
            debug!("stdin is not a terminal, not relaying keys");
            return Ok(None);
        }
        enable_raw_mode().context("failed to enable raw mode")?;

        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            while !stop_flag.load(Ordering::Relaxed) {
                match event::poll(POLL_INTERVAL) {
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(err) => {
                        debug!(%err, "key relay poll failed");
                        break;
                    }
                }
                match event::read() {
                    Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => {
                        if let Some(name) = key_name(&key) {
                            handler(&name);
                        }
                    }
                    Ok(_) => {}
                    Err(err) => {
                        debug!(%err, "key relay read failed");
                        break;
                    }
                }
            }
        });

        Ok(Some(Self {
            stop,
            handle: Some(handle),
        }))
    }
}

impl Drop for KeyRelay {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        let _ = disable_raw_mode();
    }
}

/// Player key name for a terminal key event. Ctrl-C quits like `q`.
pub(crate) fn key_name(key: &KeyEvent) -> Option<String> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some("q".to_string()),
            _ => None,
        };
    }
    let name = match key.code {
        KeyCode::Char(' ') => "SPACE".to_string(),
        KeyCode::Char(ch) => ch.to_string(),
        KeyCode::Left => "LEFT".to_string(),
        KeyCode::Right => "RIGHT".to_string(),
        KeyCode::Up => "UP".to_string(),
        KeyCode::Down => "DOWN".to_string(),
        KeyCode::Enter => "ENTER".to_string(),
        KeyCode::Esc => "ESC".to_string(),
        KeyCode::Backspace => "BS".to_string(),
        _ => return None,
    };
    Some(name)
}
