/* src/console/app.rs */

use crate::console::format::{connection_line, format_bytes, format_uptime};
use crate::console::host::{HostMetrics, HostMetricsSource};
use crate::console::throughput::ThroughputTracker;
use crate::monitor::{ConnectionId, Monitor};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Panel {
    pub title: String,
    pub lines: Vec<String>,
}

/// Fully formatted content of one render, detached from all shared state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardFrame {
    pub connections: Panel,
    pub stats: Panel,
    pub log: Panel,
}

/// What caused a render. Only the periodic tick samples throughput and host
/// metrics; the others reuse the last sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Tick,
    Resize,
    Event,
}

pub struct App {
    throughput: ThroughputTracker,
    rates: HashMap<ConnectionId, u64>,
    host: Box<dyn HostMetricsSource>,
    host_metrics: HostMetrics,
}

impl App {
    pub fn new(tick: Duration, host: Box<dyn HostMetricsSource>) -> Self {
        App {
            throughput: ThroughputTracker::new(tick),
            rates: HashMap::new(),
            host,
            host_metrics: HostMetrics::default(),
        }
    }

    pub fn build_frame(&mut self, monitor: &Monitor, trigger: Trigger) -> DashboardFrame {
        let snapshot = monitor.registry.snapshot().sorted_by_started();
        let events = monitor.events.snapshot();

        let now = Instant::now();
        if trigger == Trigger::Tick {
            self.rates = self.throughput.sample(now, &snapshot.active);
            self.host_metrics = self.host.sample();
        }

        let connections = Panel {
            title: format!("({}) Active connections", snapshot.active.len()),
            lines: snapshot
                .active
                .iter()
                .map(|conn| {
                    connection_line(
                        now.saturating_duration_since(conn.started),
                        conn.bytes_written,
                        self.rates.get(&conn.id).copied().unwrap_or(0),
                        &conn.remote,
                    )
                })
                .collect(),
        };

        let mut stats = vec![
            format!(" Total conns: {}", snapshot.total_connections),
            format!(" Total bytes: {}", format_bytes(snapshot.total_bytes())),
            format!(" Uptime:      {}", format_uptime(monitor.uptime())),
        ];
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            stats.push(format!(" Tasks:       {}", runtime.metrics().num_alive_tasks()));
        }
        stats.push(match self.host_metrics.memory_used_percent {
            Some(percent) => format!(" Used Memory: {:.2}%", percent),
            None => " Used Memory: n/a".to_string(),
        });
        stats.push(match self.host_metrics.load {
            Some(load) => format!(
                " Load:        {:.2} / {:.2} / {:.2}",
                load.one, load.five, load.fifteen
            ),
            None => " Load:        n/a".to_string(),
        });

        DashboardFrame {
            connections,
            stats: Panel {
                title: "Stats".to_string(),
                lines: stats,
            },
            log: Panel {
                title: "Log".to_string(),
                lines: events,
            },
        }
    }
}
