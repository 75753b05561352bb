//! Scripted row source with pull counting and injected failures.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rowcursor::{ReleaseError, RowSource};
use thiserror::Error;

use crate::release_log::ReleaseLog;

/// Failure injected by a [`ScriptedRowSource`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("scripted row failure on pull {pull}: {message}")]
pub struct ScriptedRowError {
    /// 1-based pull number that failed
    pub pull: usize,
    /// Message given when the failure was scripted
    pub message: String,
}

#[derive(Debug)]
enum Step<R> {
    Row(R),
    Fail(String),
}

/// Replays rows in order, failing on scripted pulls.
///
/// Take a [`SourceProbe`] before moving the source into a cursor to observe
/// how often it was pulled and released.
#[derive(Debug)]
pub struct ScriptedRowSource<R> {
    steps: VecDeque<Step<R>>,
    name: String,
    pulls: Arc<AtomicUsize>,
    releases: Arc<AtomicUsize>,
    log: Option<ReleaseLog>,
}

impl<R> ScriptedRowSource<R> {
    /// Creates a source that yields `rows` and then reports exhaustion.
    pub fn new(rows: impl IntoIterator<Item = R>) -> Self {
        Self {
            steps: rows.into_iter().map(Step::Row).collect(),
            name: "row-source".to_string(),
            pulls: Arc::new(AtomicUsize::new(0)),
            releases: Arc::new(AtomicUsize::new(0)),
            log: None,
        }
    }

    /// Makes the `pull`-th pull (1-based) fail with `message`.
    ///
    /// Scripted rows after that point shift back by one pull. A `pull` past
    /// the end of the script fails once the rows run out.
    #[must_use]
    pub fn fail_on_pull(mut self, pull: usize, message: impl Into<String>) -> Self {
        let position = pull.saturating_sub(1).min(self.steps.len());
        self.steps.insert(position, Step::Fail(message.into()));
        self
    }

    /// Records releases in `log` under `name`.
    #[must_use]
    pub fn with_log(mut self, name: impl Into<String>, log: &ReleaseLog) -> Self {
        self.name = name.into();
        self.log = Some(log.clone());
        self
    }

    /// Observer for pull and release counts.
    pub fn probe(&self) -> SourceProbe {
        SourceProbe {
            pulls: Arc::clone(&self.pulls),
            releases: Arc::clone(&self.releases),
        }
    }
}

impl<R> RowSource for ScriptedRowSource<R> {
    type Row = R;
    type Error = ScriptedRowError;

    fn pull_next(&mut self) -> Result<Option<R>, ScriptedRowError> {
        let pull = self.pulls.fetch_add(1, Ordering::SeqCst) + 1;
        match self.steps.pop_front() {
            Some(Step::Row(row)) => Ok(Some(row)),
            Some(Step::Fail(message)) => Err(ScriptedRowError { pull, message }),
            None => Ok(None),
        }
    }

    fn release(&mut self) -> Result<(), ReleaseError> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        if let Some(log) = &self.log {
            log.record(&self.name);
        }
        Ok(())
    }
}

/// Read-only view of a [`ScriptedRowSource`]'s activity.
#[derive(Debug, Clone)]
pub struct SourceProbe {
    pulls: Arc<AtomicUsize>,
    releases: Arc<AtomicUsize>,
}

impl SourceProbe {
    /// Number of `pull_next` calls so far
    pub fn pulls(&self) -> usize {
        self.pulls.load(Ordering::SeqCst)
    }

    /// Number of `release` calls so far
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}
