//! The pull-based row sequence a cursor iterates.

use crate::errors::ReleaseError;

/// A pull-based sequence of raw rows, such as an open database result set.
///
/// Implementations only fetch when [`pull_next`](RowSource::pull_next) is
/// called. The cursor guarantees it never calls `pull_next` again after it
/// returned `Ok(None)` or an error, and never after the source was released.
pub trait RowSource {
    /// Raw row delivered by this source
    type Row;

    /// Failure while fetching or reading a row
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetches the next row, or `None` once the source is exhausted.
    fn pull_next(&mut self) -> Result<Option<Self::Row>, Self::Error>;

    /// Releases the handle backing this source (e.g. the result set).
    ///
    /// Called at most once per cursor, before any other resource the cursor
    /// owns. Should tolerate the underlying handle having already been
    /// released implicitly.
    fn release(&mut self) -> Result<(), ReleaseError> {
        Ok(())
    }
}

impl<S: RowSource + ?Sized> RowSource for Box<S> {
    type Row = S::Row;
    type Error = S::Error;

    fn pull_next(&mut self) -> Result<Option<Self::Row>, Self::Error> {
        (**self).pull_next()
    }

    fn release(&mut self) -> Result<(), ReleaseError> {
        (**self).release()
    }
}
