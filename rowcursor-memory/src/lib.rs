//! In-memory row sources for `rowcursor`
//!
//! This crate provides [`RowSource`] implementations backed by plain Rust
//! collections and iterators, useful for testing and development scenarios
//! where no database is involved.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rowcursor::{ReleaseError, RowSource};

/// Row source over rows held in memory.
///
/// Never fails. Counts how often it was released through a counter that can
/// be observed after the source has been moved into a cursor.
#[derive(Debug)]
pub struct VecRowSource<R> {
    rows: VecDeque<R>,
    pulled: usize,
    releases: Arc<AtomicUsize>,
}

impl<R> VecRowSource<R> {
    /// Creates a source yielding `rows` front to back.
    pub fn new(rows: impl IntoIterator<Item = R>) -> Self {
        Self {
            rows: rows.into_iter().collect(),
            pulled: 0,
            releases: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Rows not yet pulled
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }

    /// Rows pulled so far
    pub const fn pulled(&self) -> usize {
        self.pulled
    }

    /// Shared counter of release calls
    pub fn release_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.releases)
    }
}

impl<R> From<Vec<R>> for VecRowSource<R> {
    fn from(rows: Vec<R>) -> Self {
        Self::new(rows)
    }
}

impl<R> RowSource for VecRowSource<R> {
    type Row = R;
    type Error = Infallible;

    fn pull_next(&mut self) -> Result<Option<R>, Infallible> {
        let row = self.rows.pop_front();
        if row.is_some() {
            self.pulled += 1;
        }
        Ok(row)
    }

    fn release(&mut self) -> Result<(), ReleaseError> {
        let previous = self.releases.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(
            remaining = self.rows.len(),
            previous_releases = previous,
            "released in-memory row source"
        );
        self.rows.clear();
        Ok(())
    }
}

/// Row source adapting an iterator of fallible rows.
///
/// Once the inner iterator returns `None` the source stays exhausted, even if
/// the iterator would yield again.
#[derive(Debug)]
pub struct IterRowSource<I> {
    inner: I,
    exhausted: bool,
}

impl<I> IterRowSource<I> {
    /// Wraps `inner`.
    pub const fn new(inner: I) -> Self {
        Self {
            inner,
            exhausted: false,
        }
    }

    /// True once the inner iterator returned `None`
    pub const fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

impl<I, R, E> RowSource for IterRowSource<I>
where
    I: Iterator<Item = Result<R, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    type Row = R;
    type Error = E;

    fn pull_next(&mut self) -> Result<Option<R>, E> {
        if self.exhausted {
            return Ok(None);
        }
        match self.inner.next() {
            Some(row) => row.map(Some),
            None => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }
}
