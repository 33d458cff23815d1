/* src/monitor/mod.rs */

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

pub mod connection;
pub mod event_log;
pub mod events;
pub mod registry;

pub use connection::{ConnectionId, InstrumentedConnection};
pub use events::EventSender;
pub use registry::ConnectionSnapshot;

use event_log::BoundedEventLog;
use registry::ConnectionRegistry;

/// Everything the connection workers and the dashboard share. Built once at
/// startup and cloned into each task.
#[derive(Clone)]
pub struct Monitor {
    pub registry: ConnectionRegistry,
    pub events: BoundedEventLog,
    pub redraw: Arc<Notify>,
    started: Instant,
}

impl Monitor {
    pub fn new(log_capacity: usize) -> Self {
        Monitor {
            registry: ConnectionRegistry::new(),
            events: BoundedEventLog::new(log_capacity),
            redraw: Arc::new(Notify::new()),
            started: Instant::now(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Opens the event feed and spawns the task that drains it into the log.
    pub fn spawn_event_pump(&self, cancel: CancellationToken) -> (EventSender, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let pump = tokio::spawn(events::run_event_pump(
            rx,
            self.events.clone(),
            self.redraw.clone(),
            cancel,
        ));
        (EventSender::new(tx), pump)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_reach_the_shared_log() {
        let monitor = Monitor::new(10);
        let (sender, pump) = monitor.spawn_event_pump(CancellationToken::new());

        sender.emit("10.0.0.5:4444: connected");
        drop(sender);
        pump.await.unwrap();

        assert_eq!(monitor.events.snapshot(), vec!["10.0.0.5:4444: connected"]);
    }
}
