/* src/monitor/events.rs */

use super::event_log::BoundedEventLog;
use log::{debug, info};
use std::sync::Arc;
use tokio::sync::{Notify, mpsc};
use tokio_util::sync::CancellationToken;

/// Producer side of the event feed. Cheap to clone; never blocks.
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<String>,
}

impl EventSender {
    pub fn new(tx: mpsc::UnboundedSender<String>) -> Self {
        EventSender { tx }
    }

    /// Best effort: the event is dropped if the pump is already gone.
    pub fn emit(&self, event: impl Into<String>) {
        let _ = self.tx.send(event.into());
    }
}

/// Single consumer that moves events from the channel into the log and
/// asks the render loop for a redraw after each one.
pub async fn run_event_pump(
    mut rx: mpsc::UnboundedReceiver<String>,
    log: BoundedEventLog,
    redraw: Arc<Notify>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            event = rx.recv() => match event {
                Some(event) => {
                    info!(target: "connwatch::events", "{}", event);
                    log.append(event);
                    redraw.notify_one();
                }
                None => break,
            },
        }
    }
    debug!("Event pump finished.");
}
