//! Registry of open cursors for leak detection.
//!
//! Cursors built with leak tracking enabled register here when they open and
//! deregister when they release their resources. Whatever is still registered
//! at shutdown was never closed explicitly, never exhausted, or is still
//! held somewhere. This is a debugging aid only: a cursor releases its
//! resources on drop whether or not it is tracked.

use std::collections::HashMap;
use std::panic::Location;
use std::sync::{Mutex, OnceLock};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::types::CursorId;

/// Label reported for cursors built without one.
const UNLABELLED: &str = "unlabelled";

/// Tracks cursors that are open.
#[derive(Debug, Default)]
pub struct CursorLeakDetector {
    open_cursors: Mutex<HashMap<CursorId, OpenCursor>>,
}

#[derive(Debug, Clone)]
struct OpenCursor {
    label: Option<String>,
    opened_at: Instant,
    location: &'static Location<'static>,
}

/// An open cursor as reported by [`CursorLeakDetector::report_open_cursors`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenCursorReport {
    /// Cursor identity
    pub cursor_id: CursorId,
    /// Label from the cursor's configuration
    pub label: Option<String>,
    /// Source location that built the cursor
    pub location: String,
    /// How long the cursor has been open
    pub open_for: Duration,
}

/// Aggregate view of open cursors.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CursorLeakStats {
    /// Number of open cursors
    pub total_open: usize,
    /// Open cursors per label
    pub by_label: HashMap<String, usize>,
    /// Age of the longest-open cursor
    pub oldest_open_age: Duration,
}

impl CursorLeakDetector {
    /// Creates an empty detector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that cursor `id` was opened at `location`.
    pub fn register_open(
        &self,
        id: CursorId,
        label: Option<String>,
        location: &'static Location<'static>,
    ) {
        if let Ok(mut open) = self.open_cursors.lock() {
            open.insert(
                id,
                OpenCursor {
                    label,
                    opened_at: Instant::now(),
                    location,
                },
            );
        }
    }

    /// Records that cursor `id` released its resources.
    pub fn register_release(&self, id: CursorId) {
        if let Ok(mut open) = self.open_cursors.lock() {
            open.remove(&id);
        }
    }

    /// True if `id` is currently registered as open.
    pub fn is_open(&self, id: CursorId) -> bool {
        self.open_cursors
            .lock()
            .is_ok_and(|open| open.contains_key(&id))
    }

    /// Counts open cursors by label and finds the oldest.
    pub fn stats(&self) -> CursorLeakStats {
        self.open_cursors.lock().map_or_else(
            |_| CursorLeakStats::default(),
            |open| {
                let mut by_label = HashMap::new();
                let mut oldest_open_age = Duration::ZERO;

                for cursor in open.values() {
                    let label = cursor.label.as_deref().unwrap_or(UNLABELLED);
                    *by_label.entry(label.to_string()).or_insert(0) += 1;
                    oldest_open_age = oldest_open_age.max(cursor.opened_at.elapsed());
                }

                CursorLeakStats {
                    total_open: open.len(),
                    by_label,
                    oldest_open_age,
                }
            },
        )
    }

    /// Ids of cursors open for longer than `threshold`.
    pub fn find_potential_leaks(&self, threshold: Duration) -> Vec<CursorId> {
        self.open_cursors.lock().map_or_else(
            |_| Vec::new(),
            |open| {
                open.iter()
                    .filter(|(_, cursor)| cursor.opened_at.elapsed() > threshold)
                    .map(|(id, _)| *id)
                    .collect()
            },
        )
    }

    /// Logs every open cursor at `warn` and returns them, oldest first.
    ///
    /// Meant to be called when the process shuts down.
    pub fn report_open_cursors(&self) -> Vec<OpenCursorReport> {
        let mut reports: Vec<OpenCursorReport> = self.open_cursors.lock().map_or_else(
            |_| Vec::new(),
            |open| {
                open.iter()
                    .map(|(id, cursor)| OpenCursorReport {
                        cursor_id: *id,
                        label: cursor.label.clone(),
                        location: cursor.location.to_string(),
                        open_for: cursor.opened_at.elapsed(),
                    })
                    .collect()
            },
        );
        reports.sort_by(|a, b| b.open_for.cmp(&a.open_for));

        for report in &reports {
            tracing::warn!(
                cursor_id = %report.cursor_id,
                label = report.label.as_deref().unwrap_or(UNLABELLED),
                location = %report.location,
                open_for = ?report.open_for,
                "cursor still open"
            );
        }
        reports
    }
}

static GLOBAL_LEAK_DETECTOR: OnceLock<CursorLeakDetector> = OnceLock::new();

/// The process-wide detector used by cursors with leak tracking enabled.
pub fn global_leak_detector() -> &'static CursorLeakDetector {
    GLOBAL_LEAK_DETECTOR.get_or_init(CursorLeakDetector::new)
}
