//! Shared record of released resources.

use std::sync::{Arc, Mutex};

/// Ordered, shareable log of resource names as they are released.
///
/// Clones share the same log, so one clone can be handed to every test
/// double while the test keeps another for assertions.
#[derive(Debug, Clone, Default)]
pub struct ReleaseLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl ReleaseLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `name`.
    pub fn record(&self, name: &str) {
        self.entries
            .lock()
            .expect("release log mutex should not be poisoned")
            .push(name.to_string());
    }

    /// Names released so far, in release order.
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .expect("release log mutex should not be poisoned")
            .clone()
    }

    /// How many times `name` was released.
    pub fn count_of(&self, name: &str) -> usize {
        self.entries
            .lock()
            .expect("release log mutex should not be poisoned")
            .iter()
            .filter(|entry| entry.as_str() == name)
            .count()
    }
}
