//! `rowcursor` - lazy, single-pass, resource-safe row cursors
//!
//! A [`LazyResourceCursor`] wraps the raw rows of an already-executed query
//! together with the handles the query needed (connection lease, statement,
//! result set). Rows are fetched one at a time, only when asked for, and
//! mapped into caller-defined values. The handles are released exactly once,
//! in reverse acquisition order, however iteration ends:
//!
//! - the row source is exhausted,
//! - the row source fails,
//! - the caller calls [`close`](LazyResourceCursor::close),
//! - or the cursor is dropped while still open, which also logs a warning.
//!
//! Leak tracking ([`monitor`]) can additionally record every open cursor so
//! the ones still open at shutdown can be reported.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod cursor;
pub mod errors;
pub mod mapper;
pub mod monitor;
pub mod resource;
pub mod source;
pub mod types;

pub use config::CursorConfig;
pub use cursor::{CursorBuilder, LazyResourceCursor};
pub use errors::{BoxError, CursorError, CursorResult, ReleaseError, RowAccessError};
pub use mapper::RowMapper;
pub use monitor::{global_leak_detector, CursorLeakDetector, CursorLeakStats, OpenCursorReport};
pub use resource::{Releasable, ResourceHandle, ResourceStack};
pub use source::RowSource;
pub use types::{CursorId, ResourceName, RowIndex};
