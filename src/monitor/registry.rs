/* src/monitor/registry.rs */

use super::connection::{ConnectionId, ConnectionMeter};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::time::Instant;

#[derive(Debug)]
struct Registration {
    // Only the handle holding this token may remove the entry.
    token: u64,
    meter: Arc<ConnectionMeter>,
}

#[derive(Debug, Default)]
struct RegistryState {
    next_id: u64,
    next_token: u64,
    // Keyed by registration order, so iteration is arrival order.
    active: BTreeMap<ConnectionId, Registration>,
    total_connections: u64,
    closed_bytes: u64,
}

/// Process-wide set of active connections plus the historical totals.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    state: Arc<Mutex<RegistryState>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionSnapshot {
    pub id: ConnectionId,
    pub remote: String,
    pub started: Instant,
    pub bytes_written: u64,
}

/// Point-in-time copy of the registry. Owns all of its data.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    pub active: Vec<ConnectionSnapshot>,
    pub total_connections: u64,
    pub closed_bytes: u64,
}

impl RegistrySnapshot {
    /// Bytes sent by closed connections plus what the active ones have sent so far.
    pub fn total_bytes(&self) -> u64 {
        self.closed_bytes
            + self
                .active
                .iter()
                .map(|conn| conn.bytes_written)
                .sum::<u64>()
    }

    /// Earliest first; connections that started at the same instant keep arrival order.
    pub fn sorted_by_started(mut self) -> Self {
        self.active.sort_by_key(|conn| conn.started);
        self
    }
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Every critical section is a few map operations, none of them can leave the
    // state half-updated, so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn next_id(&self) -> ConnectionId {
        let mut state = self.lock();
        state.next_id += 1;
        ConnectionId(state.next_id)
    }

    /// Builds a meter for a freshly accepted peer and registers it.
    pub fn open(&self, remote: impl Into<String>) -> (Arc<ConnectionMeter>, RegistrationHandle) {
        let meter = Arc::new(ConnectionMeter::new(self.next_id(), remote));
        let handle = self.register(meter.clone());
        (meter, handle)
    }

    /// Adds the meter to the active set. Registering a connection that is
    /// already active returns an inert handle: closing or dropping it leaves
    /// the live registration alone.
    pub fn register(&self, meter: Arc<ConnectionMeter>) -> RegistrationHandle {
        let token = {
            let mut state = self.lock();
            state.next_token += 1;
            let token = state.next_token;
            match state.active.entry(meter.id()) {
                Entry::Vacant(slot) => {
                    slot.insert(Registration {
                        token,
                        meter: meter.clone(),
                    });
                    state.total_connections += 1;
                    Some(token)
                }
                Entry::Occupied(_) => None,
            }
        };
        match token {
            Some(_) => debug!("Registered connection {} from {}", meter.id(), meter.remote()),
            None => warn!("Connection {} registered twice; ignoring.", meter.id()),
        }
        RegistrationHandle {
            registry: self.clone(),
            meter,
            token,
        }
    }

    /// Removes the connection and folds its final byte count into the closed total.
    /// Returns false if it was already gone or the handle does not own the
    /// registration, in which case nothing is counted.
    pub fn unregister(&self, handle: &RegistrationHandle) -> bool {
        let Some(token) = handle.token else {
            return false;
        };
        let closed = {
            let mut state = self.lock();
            let state = &mut *state;
            match state.active.entry(handle.meter.id()) {
                Entry::Occupied(slot) if slot.get().token == token => {
                    state.closed_bytes += slot.remove().meter.bytes_written();
                    true
                }
                _ => false,
            }
        };
        if closed {
            debug!(
                "Unregistered connection {} from {}",
                handle.meter.id(),
                handle.meter.remote()
            );
        }
        closed
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        let state = self.lock();
        RegistrySnapshot {
            active: state
                .active
                .values()
                .map(|Registration { meter, .. }| ConnectionSnapshot {
                    id: meter.id(),
                    remote: meter.remote().to_string(),
                    started: meter.started(),
                    bytes_written: meter.bytes_written(),
                })
                .collect(),
            total_connections: state.total_connections,
            closed_bytes: state.closed_bytes,
        }
    }

    pub fn active_count(&self) -> usize {
        self.lock().active.len()
    }
}

/// Keeps a connection registered for as long as it lives. Dropping it
/// unregisters, so an early return still lands the bytes in the totals.
#[must_use = "dropping the handle unregisters the connection immediately"]
pub struct RegistrationHandle {
    registry: ConnectionRegistry,
    meter: Arc<ConnectionMeter>,
    token: Option<u64>,
}

impl RegistrationHandle {
    pub fn close(self) -> bool {
        self.registry.unregister(&self)
    }
}

impl Drop for RegistrationHandle {
    fn drop(&mut self) {
        self.registry.unregister(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::connection::{DEFAULT_WRITE_TIMEOUT, InstrumentedConnection};
    use std::time::Duration;
    use tokio::time;

    #[tokio::test(start_paused = true)]
    async fn single_connection_lifecycle() {
        let registry = ConnectionRegistry::new();

        let (meter, handle) = registry.open("10.0.0.5:4444");
        let conn = InstrumentedConnection::new(tokio::io::sink(), meter, DEFAULT_WRITE_TIMEOUT);

        time::sleep(Duration::from_millis(100)).await;
        conn.write_all(&[0u8; 2048]).await.unwrap();

        time::sleep(Duration::from_millis(400)).await;
        let snap = registry.snapshot();
        assert_eq!(snap.active.len(), 1);
        assert_eq!(snap.active[0].remote, "10.0.0.5:4444");
        assert_eq!(snap.active[0].bytes_written, 2048);
        assert_eq!(snap.total_connections, 1);
        assert_eq!(snap.closed_bytes, 0);
        assert_eq!(snap.total_bytes(), 2048);

        time::sleep(Duration::from_millis(100)).await;
        assert!(registry.unregister(&handle));
        let snap = registry.snapshot();
        assert!(snap.active.is_empty());
        assert_eq!(snap.closed_bytes, 2048);
        assert_eq!(snap.total_bytes(), 2048);
    }

    #[test]
    fn double_unregister_counts_bytes_once() {
        let registry = ConnectionRegistry::new();
        let (meter, handle) = registry.open("10.0.0.6:5555");
        meter.record(700);

        assert!(registry.unregister(&handle));
        assert!(!registry.unregister(&handle));
        assert!(!handle.close());

        let snap = registry.snapshot();
        assert_eq!(snap.closed_bytes, 700);
        assert_eq!(snap.total_connections, 1);
    }

    #[test]
    fn dropping_the_handle_unregisters() {
        let registry = ConnectionRegistry::new();
        {
            let (meter, _handle) = registry.open("192.168.1.9:22");
            meter.record(42);
            assert_eq!(registry.active_count(), 1);
        }
        let snap = registry.snapshot();
        assert_eq!(registry.active_count(), 0);
        assert_eq!(snap.closed_bytes, 42);
    }

    #[test]
    fn total_connections_ignores_unregister() {
        let registry = ConnectionRegistry::new();
        let handles: Vec<_> = (0..10)
            .map(|i| registry.open(format!("10.1.0.{}:22", i)).1)
            .collect();
        assert_eq!(registry.snapshot().total_connections, 10);

        for handle in handles {
            handle.close();
        }
        let snap = registry.snapshot();
        assert_eq!(snap.total_connections, 10);
        assert!(snap.active.is_empty());
    }

    #[test]
    fn registering_the_same_meter_twice_counts_once() {
        let registry = ConnectionRegistry::new();
        let meter = Arc::new(ConnectionMeter::new(registry.next_id(), "10.2.0.1:22"));
        let first = registry.register(meter.clone());
        let second = registry.register(meter);

        assert_eq!(registry.snapshot().total_connections, 1);
        assert!(first.close());
        assert!(!second.close());
    }

    #[test]
    fn duplicate_handle_cannot_close_the_live_registration() {
        let registry = ConnectionRegistry::new();
        let meter = Arc::new(ConnectionMeter::new(registry.next_id(), "10.2.0.2:22"));
        let live = registry.register(meter.clone());
        meter.record(100);

        drop(registry.register(meter.clone()));
        assert_eq!(registry.active_count(), 1);
        meter.record(900);

        let snap = registry.snapshot();
        assert_eq!(snap.active[0].bytes_written, 1000);
        assert_eq!(snap.closed_bytes, 0);

        assert!(live.close());
        let snap = registry.snapshot();
        assert_eq!(snap.closed_bytes, 1000);
        assert_eq!(snap.total_connections, 1);
    }

    #[test]
    fn stale_handle_leaves_a_later_registration_alone() {
        let registry = ConnectionRegistry::new();
        let meter = Arc::new(ConnectionMeter::new(registry.next_id(), "10.2.0.3:22"));
        let stale = registry.register(meter.clone());
        meter.record(50);
        assert!(registry.unregister(&stale));

        let again = registry.register(meter.clone());
        assert!(!registry.unregister(&stale));
        drop(stale);
        assert_eq!(registry.active_count(), 1);

        meter.record(50);
        assert!(again.close());
        let snap = registry.snapshot();
        assert_eq!(snap.closed_bytes, 150);
        assert_eq!(snap.total_connections, 2);
    }

    #[tokio::test]
    async fn concurrent_accept_paths() {
        let registry = ConnectionRegistry::new();
        let mut tasks = Vec::new();
        for i in 0..32u64 {
            let registry = registry.clone();
            tasks.push(tokio::spawn(async move {
                let (meter, handle) = registry.open(format!("10.3.0.{}:22", i));
                meter.record(i + 1);
                tokio::task::yield_now().await;
                if i % 2 == 0 {
                    handle.close();
                    None
                } else {
                    Some(handle)
                }
            }));
        }

        let mut kept = Vec::new();
        for task in tasks {
            if let Some(handle) = task.await.unwrap() {
                kept.push(handle);
            }
        }

        let snap = registry.snapshot();
        assert_eq!(snap.total_connections, 32);
        assert_eq!(snap.active.len(), 16);
        let closed: u64 = (0..32u64).filter(|i| i % 2 == 0).map(|i| i + 1).sum();
        assert_eq!(snap.closed_bytes, closed);
        assert_eq!(snap.total_bytes(), (1..=32u64).sum::<u64>());
        drop(kept);
    }

    #[tokio::test(start_paused = true)]
    async fn sorts_by_start_time_with_arrival_tiebreak() {
        let registry = ConnectionRegistry::new();
        let (_a, _ha) = registry.open("a:1");
        let (_b, _hb) = registry.open("b:1");
        time::advance(Duration::from_secs(1)).await;
        let (_c, _hc) = registry.open("c:1");

        let snap = registry.snapshot().sorted_by_started();
        let remotes: Vec<&str> = snap.active.iter().map(|c| c.remote.as_str()).collect();
        assert_eq!(remotes, vec!["a:1", "b:1", "c:1"]);
    }

    #[test]
    fn snapshot_is_detached_from_later_writes() {
        let registry = ConnectionRegistry::new();
        let (meter, _handle) = registry.open("10.4.0.1:22");
        meter.record(10);
        let snap = registry.snapshot();
        meter.record(10);

        assert_eq!(snap.active[0].bytes_written, 10);
        assert_eq!(registry.snapshot().active[0].bytes_written, 20);
    }
}
