/* src/console/throughput.rs */

use crate::monitor::{ConnectionId, ConnectionSnapshot};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Per-connection byte rate between two consecutive samples.
pub struct ThroughputTracker {
    interval: Duration,
    previous: HashMap<ConnectionId, u64>,
    sampled_at: Option<Instant>,
}

impl ThroughputTracker {
    pub fn new(interval: Duration) -> Self {
        ThroughputTracker {
            interval,
            previous: HashMap::new(),
            sampled_at: None,
        }
    }

    /// Returns bytes/sec per connection, measured over the time since the
    /// previous sample. Connections not seen in the previous sample report 0;
    /// connections that disappeared are forgotten.
    pub fn sample(
        &mut self,
        now: Instant,
        active: &[ConnectionSnapshot],
    ) -> HashMap<ConnectionId, u64> {
        // Ticks can be skipped under load, so the gap may span several intervals.
        let elapsed = self
            .sampled_at
            .map(|prev| now.saturating_duration_since(prev))
            .filter(|gap| !gap.is_zero())
            .unwrap_or(self.interval);
        let secs = elapsed.as_secs_f64();
        let mut current = HashMap::with_capacity(active.len());
        let mut rates = HashMap::with_capacity(active.len());

        for conn in active {
            let delta = self
                .previous
                .get(&conn.id)
                .map_or(0, |prev| conn.bytes_written.saturating_sub(*prev));
            let rate = if secs > 0.0 {
                (delta as f64 / secs) as u64
            } else {
                0
            };
            rates.insert(conn.id, rate);
            current.insert(conn.id, conn.bytes_written);
        }

        self.previous = current;
        self.sampled_at = Some(now);
        rates
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.previous.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(id: u64, bytes: u64) -> ConnectionSnapshot {
        ConnectionSnapshot {
            id: ConnectionId(id),
            remote: format!("10.0.0.{}:22", id),
            started: Instant::now(),
            bytes_written: bytes,
        }
    }

    #[test]
    fn first_sample_reports_zero() {
        let mut tracker = ThroughputTracker::new(Duration::from_millis(500));
        let rates = tracker.sample(Instant::now(), &[conn(1, 5000)]);
        assert_eq!(rates[&ConnectionId(1)], 0);
    }

    #[test]
    fn rate_is_delta_over_interval() {
        let mut tracker = ThroughputTracker::new(Duration::from_millis(500));
        let t0 = Instant::now();
        tracker.sample(t0, &[conn(1, 1000)]);
        let rates = tracker.sample(t0 + Duration::from_millis(500), &[conn(1, 1500)]);
        assert_eq!(rates[&ConnectionId(1)], 1000);
    }

    #[test]
    fn skipped_ticks_stretch_the_measured_interval() {
        let mut tracker = ThroughputTracker::new(Duration::from_millis(500));
        let t0 = Instant::now();
        tracker.sample(t0, &[conn(1, 0)]);
        // Two ticks' worth of time passed before the next sample.
        let rates = tracker.sample(t0 + Duration::from_secs(1), &[conn(1, 1000)]);
        assert_eq!(rates[&ConnectionId(1)], 1000);
    }

    #[test]
    fn same_instant_falls_back_to_the_interval() {
        let mut tracker = ThroughputTracker::new(Duration::from_millis(500));
        let t0 = Instant::now();
        tracker.sample(t0, &[conn(1, 0)]);
        let rates = tracker.sample(t0, &[conn(1, 250)]);
        assert_eq!(rates[&ConnectionId(1)], 500);
    }

    #[test]
    fn vanished_connections_are_dropped() {
        let mut tracker = ThroughputTracker::new(Duration::from_secs(1));
        let t0 = Instant::now();
        tracker.sample(t0, &[conn(1, 100), conn(2, 200)]);
        assert_eq!(tracker.tracked(), 2);

        let rates = tracker.sample(t0 + Duration::from_secs(1), &[conn(2, 260), conn(3, 50)]);
        assert_eq!(tracker.tracked(), 2);
        assert!(!rates.contains_key(&ConnectionId(1)));
        assert_eq!(rates[&ConnectionId(2)], 60);
        assert_eq!(rates[&ConnectionId(3)], 0);

        // Id 1 comes back: it starts over as a new connection would.
        let rates = tracker.sample(t0 + Duration::from_secs(2), &[conn(1, 900)]);
        assert_eq!(rates[&ConnectionId(1)], 0);
    }
}
