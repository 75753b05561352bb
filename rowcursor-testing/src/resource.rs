//! Release-counting resource handles.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rowcursor::{ReleaseError, Releasable};

use crate::release_log::ReleaseLog;

/// A resource handle that records every release.
///
/// Take a [`ReleaseTracker`] before moving the resource into a cursor to
/// observe it afterwards.
#[derive(Debug, Clone)]
pub struct TrackedResource {
    name: String,
    releases: Arc<AtomicUsize>,
    log: Option<ReleaseLog>,
    failing: bool,
}

impl TrackedResource {
    /// Creates a resource named `name` that releases successfully.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            releases: Arc::new(AtomicUsize::new(0)),
            log: None,
            failing: false,
        }
    }

    /// Appends this resource's name to `log` on every release.
    #[must_use]
    pub fn with_log(mut self, log: &ReleaseLog) -> Self {
        self.log = Some(log.clone());
        self
    }

    /// Makes every release fail after being counted.
    #[must_use]
    pub const fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Name given at construction
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Observer for this resource's release count.
    pub fn tracker(&self) -> ReleaseTracker {
        ReleaseTracker {
            releases: Arc::clone(&self.releases),
        }
    }
}

impl Releasable for TrackedResource {
    fn release(&mut self) -> Result<(), ReleaseError> {
        let count = self.releases.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(log) = &self.log {
            log.record(&self.name);
        }
        tracing::trace!(resource = %self.name, count, "tracked resource released");

        if self.failing {
            Err(ReleaseError::failed(format!("{} refused to release", self.name)))
        } else {
            Ok(())
        }
    }
}

/// Read-only view of a [`TrackedResource`]'s release count.
#[derive(Debug, Clone)]
pub struct ReleaseTracker {
    releases: Arc<AtomicUsize>,
}

impl ReleaseTracker {
    /// Number of release calls so far
    pub fn count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// True if released exactly once
    pub fn released_once(&self) -> bool {
        self.count() == 1
    }
}
