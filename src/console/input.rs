/* src/console/input.rs */

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use log::{debug, error};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    Resize(u16, u16),
    Quit,
}

pub fn translate(event: Event) -> Option<ControlEvent> {
    match event {
        Event::Resize(width, height) => Some(ControlEvent::Resize(width, height)),
        Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(ControlEvent::Quit)
            }
            KeyCode::Char('q') | KeyCode::Esc => Some(ControlEvent::Quit),
            _ => None,
        },
        _ => None,
    }
}

/// Terminal input is a blocking API, so it gets its own thread that feeds
/// the render loop over a channel.
pub fn spawn_input_thread(
    tx: mpsc::Sender<ControlEvent>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while !cancel.is_cancelled() {
            match event::poll(POLL_INTERVAL) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    error!("Terminal input failed: {}", e);
                    break;
                }
            }

            let control = match event::read() {
                Ok(event) => translate(event),
                Err(e) => {
                    error!("Terminal input failed: {}", e);
                    break;
                }
            };

            if let Some(control) = control {
                if tx.blocking_send(control).is_err() {
                    break;
                }
            }
        }
        debug!("Input thread finished.");
    })
}
