/* src/monitor/event_log.rs */

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub const DEFAULT_LOG_CAPACITY: usize = 30;

/// Rolling window over the most recent events. Oldest entries are evicted
/// first and snapshots come back oldest first.
#[derive(Clone)]
pub struct BoundedEventLog {
    entries: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl BoundedEventLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        BoundedEventLog {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn append(&self, event: impl Into<String>) {
        let mut entries = self.lock();
        entries.push_back(event.into());
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.lock().iter().cloned().collect()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    #[cfg(test)]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for BoundedEventLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}
