//! The lazy, single-pass cursor.
//!
//! [`LazyResourceCursor`] pulls one raw row at a time from its [`RowSource`],
//! maps it through the caller's [`RowMapper`] and memoizes the result until it
//! is taken. It owns every resource handle the query needed and releases them
//! exactly once: when the source runs dry, when the source fails, when
//! [`close`](LazyResourceCursor::close) is called, or, as a last resort, when
//! the cursor is dropped while still open.
//!
//! # Example
//!
//! ```rust
//! use std::convert::Infallible;
//! use rowcursor::{CursorBuilder, ReleaseError, ResourceName, RowIndex, RowSource};
//!
//! struct Letters(std::vec::IntoIter<&'static str>);
//!
//! impl RowSource for Letters {
//!     type Row = &'static str;
//!     type Error = std::io::Error;
//!
//!     fn pull_next(&mut self) -> Result<Option<Self::Row>, Self::Error> {
//!         Ok(self.0.next())
//!     }
//! }
//!
//! let mut cursor = CursorBuilder::new(Letters(vec!["a", "b"].into_iter()))
//!     .resource(ResourceName::try_new("connection").unwrap(), || Ok::<(), ReleaseError>(()))
//!     .build(|row: &str, _index: RowIndex| Ok::<_, Infallible>(row.to_uppercase()));
//!
//! assert_eq!(cursor.take_next().unwrap(), "A");
//! assert_eq!(cursor.take_next().unwrap(), "B");
//! assert!(!cursor.has_next().unwrap());
//! assert!(cursor.is_closed());
//! ```
//!
//! # Threading
//!
//! A cursor is meant to be driven by one caller at a time. Every pull takes
//! `&mut self`; share a cursor by wrapping it in a mutex at the call site.

use std::fmt;
use std::iter::FusedIterator;
use std::mem;
use std::panic::Location;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::CursorConfig;
use crate::errors::{CursorError, CursorResult, RowAccessError};
use crate::mapper::RowMapper;
use crate::monitor::global_leak_detector;
use crate::resource::{Releasable, ResourceHandle, ResourceStack};
use crate::source::RowSource;
use crate::types::{CursorId, ResourceName, RowIndex};

enum State<T> {
    /// A mapped value is memoized and ready to hand out
    Ready(T),
    /// The next value has not been computed yet
    NotReady,
    /// Source exhausted and resources released
    Done,
    /// A computation is in progress; seen by a caller only after a panic
    Failed,
}

impl<T> State<T> {
    const fn name(&self) -> &'static str {
        match self {
            Self::Ready(_) => "ready",
            Self::NotReady => "not_ready",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

/// A pull-based cursor over rows that releases its resources exactly once.
///
/// See the [module documentation](self) for an example.
pub struct LazyResourceCursor<S, M>
where
    S: RowSource,
    M: RowMapper<S::Row>,
{
    id: CursorId,
    label: Option<String>,
    source: S,
    resources: ResourceStack,
    resource_names: Vec<ResourceName>,
    mapper: M,
    state: State<M::Output>,
    row_index: RowIndex,
    released: AtomicBool,
    tracked: bool,
}

impl<S, M> LazyResourceCursor<S, M>
where
    S: RowSource,
    M: RowMapper<S::Row>,
{
    /// Starts building a cursor over `source`.
    pub fn builder(source: S) -> CursorBuilder<S> {
        CursorBuilder::new(source)
    }

    /// Creates a cursor with default configuration.
    ///
    /// `resources` must hold the handles in acquisition order.
    #[track_caller]
    pub fn new(source: S, resources: ResourceStack, mapper: M) -> Self {
        Self::open(
            source,
            ResourceName::row_source(),
            resources,
            mapper,
            CursorConfig::default(),
            Location::caller(),
        )
    }

    fn open(
        source: S,
        source_name: ResourceName,
        resources: ResourceStack,
        mapper: M,
        config: CursorConfig,
        location: &'static Location<'static>,
    ) -> Self {
        let id = CursorId::generate();
        let resource_names = std::iter::once(source_name)
            .chain(resources.names_in_release_order().cloned())
            .collect();

        if config.track_leaks {
            global_leak_detector().register_open(id, config.label.clone(), location);
        }

        let cursor = Self {
            id,
            label: config.label,
            source,
            resources,
            resource_names,
            mapper,
            state: State::NotReady,
            row_index: RowIndex::first(),
            released: AtomicBool::new(false),
            tracked: config.track_leaks,
        };
        tracing::debug!(cursor_id = %cursor.id, %location, "cursor opened");
        cursor
    }

    /// Returns true if another row is available, computing it if necessary.
    ///
    /// Repeated calls without an intervening [`take_next`](Self::take_next)
    /// pull from the source at most once. Reaching the end of the source
    /// releases every resource before `false` is returned.
    pub fn has_next(&mut self) -> CursorResult<bool, M::Error> {
        match self.state {
            State::Failed => Err(CursorError::InternalInvariant(
                "cursor is mid-computation; a previous call did not complete",
            )),
            State::Done => Ok(false),
            State::Ready(_) => Ok(true),
            State::NotReady => self.try_compute_next(),
        }
    }

    /// Hands out the next mapped value.
    pub fn take_next(&mut self) -> CursorResult<M::Output, M::Error> {
        if !self.has_next()? {
            return Err(CursorError::NoMoreElements);
        }
        match mem::replace(&mut self.state, State::NotReady) {
            State::Ready(value) => Ok(value),
            other => {
                self.state = other;
                Err(CursorError::InternalInvariant(
                    "no memoized value after has_next returned true",
                ))
            }
        }
    }

    /// Rejected: a cursor never mutates its source.
    pub fn remove(&mut self) -> CursorResult<(), M::Error> {
        Err(CursorError::Unsupported {
            operation: "remove",
        })
    }

    /// Releases the row source and then every resource handle, last acquired
    /// first. Only the first call does anything.
    ///
    /// Release failures are logged and never returned. After closing, the
    /// cursor reports no further rows, including any memoized lookahead.
    pub fn close(&mut self) {
        if self
            .released
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let mut failures = 0;
        if let Err(error) = self.source.release() {
            failures += 1;
            tracing::warn!(
                cursor_id = %self.id,
                resource = %self.resource_names[0],
                %error,
                "failed to release cursor resource"
            );
        }
        failures += self.resources.release_all();
        self.state = State::Done;

        if self.tracked {
            global_leak_detector().register_release(self.id);
        }
        tracing::debug!(
            cursor_id = %self.id,
            rows = %self.row_index,
            failures,
            "cursor closed"
        );
    }

    /// True once the cursor's resources have been released.
    pub fn is_closed(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Identity of this cursor
    pub const fn id(&self) -> CursorId {
        self.id
    }

    /// Label from the cursor's configuration
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Index the next row handed to the mapper will receive
    pub const fn row_index(&self) -> RowIndex {
        self.row_index
    }

    /// Runs `f` with the cursor and closes it afterwards.
    ///
    /// If `f` panics the cursor is closed while unwinding, without the
    /// dropped-while-open warning.
    pub fn scoped<R>(mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let guard = CloseOnExit(&mut self);
        let result = f(&mut *guard.0);
        drop(guard);
        result
    }

    fn try_compute_next(&mut self) -> CursorResult<bool, M::Error> {
        // stays Failed if anything below unwinds
        self.state = State::Failed;

        if self.is_closed() {
            return Ok(self.end_of_data());
        }

        let row = match self.source.pull_next() {
            Ok(Some(row)) => row,
            Ok(None) => {
                self.close();
                return Ok(self.end_of_data());
            }
            Err(error) => {
                let error = RowAccessError::new(self.row_index, error);
                tracing::debug!(cursor_id = %self.id, %error, "row source failed");
                self.close();
                self.end_of_data();
                return Err(error.into());
            }
        };

        let index = self.row_index;
        self.row_index = index.next();
        tracing::trace!(cursor_id = %self.id, row_index = %index, "mapping row");

        match self.mapper.map_row(row, index) {
            Ok(value) => {
                self.state = State::Ready(value);
                Ok(true)
            }
            Err(error) => {
                self.state = State::NotReady;
                Err(CursorError::Mapping(error))
            }
        }
    }

    fn end_of_data(&mut self) -> bool {
        self.state = State::Done;
        false
    }
}

impl<S, M> Iterator for LazyResourceCursor<S, M>
where
    S: RowSource,
    M: RowMapper<S::Row>,
{
    type Item = CursorResult<M::Output, M::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.has_next() {
            Ok(true) => Some(self.take_next()),
            Ok(false) => None,
            Err(error @ CursorError::InternalInvariant(_)) => {
                // reported once, then the iterator ends
                self.close();
                Some(Err(error))
            }
            Err(error) => Some(Err(error)),
        }
    }
}

impl<S, M> FusedIterator for LazyResourceCursor<S, M>
where
    S: RowSource,
    M: RowMapper<S::Row>,
{
}

/// Closes the borrowed cursor when dropped, including during unwinding.
struct CloseOnExit<'a, S, M>(&'a mut LazyResourceCursor<S, M>)
where
    S: RowSource,
    M: RowMapper<S::Row>;

impl<S, M> Drop for CloseOnExit<'_, S, M>
where
    S: RowSource,
    M: RowMapper<S::Row>,
{
    fn drop(&mut self) {
        self.0.close();
    }
}

impl<S, M> Drop for LazyResourceCursor<S, M>
where
    S: RowSource,
    M: RowMapper<S::Row>,
{
    fn drop(&mut self) {
        if !self.is_closed() {
            tracing::warn!(
                cursor_id = %self.id,
                cursor = %self,
                "cursor dropped without being closed, releasing its resources"
            );
            self.close();
        }
    }
}

impl<S, M> fmt::Display for LazyResourceCursor<S, M>
where
    S: RowSource,
    M: RowMapper<S::Row>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LazyResourceCursor{{id={}, label={}, resources=[",
            self.id,
            self.label.as_deref().unwrap_or("-")
        )?;
        for (i, name) in self.resource_names.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}")?;
        }
        write!(
            f,
            "], closed={}, row_index={}}}",
            self.is_closed(),
            self.row_index
        )
    }
}

impl<S, M> fmt::Debug for LazyResourceCursor<S, M>
where
    S: RowSource,
    M: RowMapper<S::Row>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyResourceCursor")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("resources", &self.resource_names)
            .field("state", &self.state.name())
            .field("closed", &self.is_closed())
            .field("row_index", &self.row_index)
            .finish_non_exhaustive()
    }
}

/// Assembles a [`LazyResourceCursor`] from already-acquired handles.
///
/// Handles are added in acquisition order and released in reverse, after the
/// row source. Handles added to a builder that is never built are dropped
/// without being released.
#[derive(Debug)]
pub struct CursorBuilder<S> {
    source: S,
    source_name: ResourceName,
    resources: ResourceStack,
    config: CursorConfig,
}

impl<S: RowSource> CursorBuilder<S> {
    /// Starts a builder over `source`.
    pub fn new(source: S) -> Self {
        Self {
            source,
            source_name: ResourceName::row_source(),
            resources: ResourceStack::new(),
            config: CursorConfig::default(),
        }
    }

    /// Names the row source in diagnostics (defaults to `row-source`).
    #[must_use]
    pub fn source_name(mut self, name: ResourceName) -> Self {
        self.source_name = name;
        self
    }

    /// Adds a handle acquired after those already added.
    #[must_use]
    pub fn resource(
        mut self,
        name: ResourceName,
        resource: impl Releasable + Send + 'static,
    ) -> Self {
        self.resources.push(ResourceHandle::new(name, resource));
        self
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn config(mut self, config: CursorConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the cursor. Nothing is pulled from the source yet.
    #[track_caller]
    pub fn build<M: RowMapper<S::Row>>(self, mapper: M) -> LazyResourceCursor<S, M> {
        LazyResourceCursor::open(
            self.source,
            self.source_name,
            self.resources,
            mapper,
            self.config,
            Location::caller(),
        )
    }
}
