//! Error types for rowcursor.
//!
//! The cursor distinguishes failures it owns from failures it merely relays:
//!
//! - **RowAccess**: the row source failed while fetching the next row. The
//!   cursor has already released its resources when this is returned.
//! - **Mapping**: the caller's mapper failed. Passed through untouched; the
//!   cursor stays open and positioned after the failed row.
//! - **NoMoreElements**: a value was requested from an exhausted cursor.
//! - **InternalInvariant**: the cursor observed its own in-progress guard,
//!   which only happens after a mapper panic was caught by the caller.
//! - **Unsupported**: the caller asked the cursor to mutate its source.
//!
//! Release failures never surface here. They are logged by the cursor and
//! reported through [`ReleaseError`] only to the code that performs releases.

use thiserror::Error;

use crate::types::RowIndex;

/// Boxed cause carried by errors that wrap collaborator failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by [`LazyResourceCursor`](crate::cursor::LazyResourceCursor).
///
/// `E` is the error type of the cursor's row mapper.
///
/// # Example
///
/// ```rust,ignore
/// match cursor.take_next() {
///     Ok(user) => render(user),
///     Err(CursorError::Mapping(bad_row)) => {
///         // one row could not be converted, the rest are still readable
///         skipped.push(bad_row);
///     }
///     Err(CursorError::RowAccess(e)) => return Err(e.into()),
///     Err(e) => panic!("cursor misuse: {e}"),
/// }
/// ```
#[derive(Debug, Error)]
pub enum CursorError<E> {
    /// The row source failed while fetching or reading the next row.
    #[error(transparent)]
    RowAccess(#[from] RowAccessError),

    /// The row mapper failed. The mapper's error is relayed unchanged.
    #[error(transparent)]
    Mapping(E),

    /// A value was requested but the cursor has no more rows.
    #[error("no more rows in cursor")]
    NoMoreElements,

    /// The cursor's in-progress guard was observed by a caller.
    #[error("cursor invariant violated: {0}")]
    InternalInvariant(&'static str),

    /// The requested operation is not supported by a read-only cursor.
    #[error("unsupported cursor operation: {operation}")]
    Unsupported {
        /// Name of the rejected operation
        operation: &'static str,
    },
}

impl<E> CursorError<E> {
    /// Returns true if this error came from the row mapper.
    pub const fn is_mapping(&self) -> bool {
        matches!(self, Self::Mapping(_))
    }

    /// Returns the mapper's error if this is a mapping failure.
    pub fn into_mapping(self) -> Option<E> {
        match self {
            Self::Mapping(e) => Some(e),
            _ => None,
        }
    }
}

/// A failure raised by the row source while pulling a row.
///
/// The original cause is kept as the error source.
#[derive(Debug, Error)]
#[error("failed to read row {row_index} from row source: {source}")]
pub struct RowAccessError {
    /// Index the failed row would have received
    pub row_index: RowIndex,
    /// Underlying row source failure
    #[source]
    pub source: BoxError,
}

impl RowAccessError {
    /// Wraps a row source failure observed at `row_index`.
    pub fn new(row_index: RowIndex, source: impl Into<BoxError>) -> Self {
        Self {
            row_index,
            source: source.into(),
        }
    }
}

/// Failure to release a single resource handle.
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// Release failed with a descriptive message.
    #[error("release failed: {0}")]
    Failed(String),

    /// Release failed with an underlying error.
    #[error(transparent)]
    Other(#[from] BoxError),
}

impl ReleaseError {
    /// Creates a release error from a message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Result type for cursor operations whose mapper fails with `E`.
pub type CursorResult<T, E> = Result<T, CursorError<E>>;
