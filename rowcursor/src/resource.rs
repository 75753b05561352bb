//! Resource handles and their ordered release.
//!
//! A cursor is built from handles that were already acquired by whoever ran
//! the query: typically a connection lease first, then a statement. The
//! [`ResourceStack`] keeps them in acquisition order and releases them in
//! reverse, once, attempting every step even when an earlier one fails.

use std::fmt;

use crate::errors::ReleaseError;
use crate::types::ResourceName;

/// An acquired external object that must be explicitly released.
///
/// Implementations should tolerate the underlying object having already been
/// released implicitly (for example a statement closed together with its
/// connection).
pub trait Releasable {
    /// Releases the resource.
    fn release(&mut self) -> Result<(), ReleaseError>;
}

impl<F> Releasable for F
where
    F: FnMut() -> Result<(), ReleaseError>,
{
    fn release(&mut self) -> Result<(), ReleaseError> {
        self()
    }
}

/// A named resource owned by a cursor.
pub struct ResourceHandle {
    name: ResourceName,
    inner: Box<dyn Releasable + Send>,
}

impl ResourceHandle {
    /// Wraps `resource` under `name`.
    pub fn new(name: ResourceName, resource: impl Releasable + Send + 'static) -> Self {
        Self {
            name,
            inner: Box::new(resource),
        }
    }

    /// Name used for this handle in diagnostics
    pub const fn name(&self) -> &ResourceName {
        &self.name
    }

    fn release(mut self) -> Result<(), ReleaseError> {
        self.inner.release()
    }
}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Handles kept in acquisition order and released in reverse.
#[derive(Debug, Default)]
pub struct ResourceStack {
    handles: Vec<ResourceHandle>,
}

impl ResourceStack {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a handle acquired after every handle already on the stack.
    pub fn push(&mut self, handle: ResourceHandle) {
        self.handles.push(handle);
    }

    /// Number of handles not yet released
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// True when every handle has been released (or none was pushed)
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Names of the held handles in release order (last acquired first).
    pub fn names_in_release_order(&self) -> impl Iterator<Item = &ResourceName> {
        self.handles.iter().rev().map(ResourceHandle::name)
    }

    /// Releases every handle, last acquired first.
    ///
    /// Every handle is attempted. Failures are logged at `warn` and counted;
    /// the stack is empty afterwards, so a second call releases nothing.
    pub fn release_all(&mut self) -> usize {
        let mut failures = 0;
        while let Some(handle) = self.handles.pop() {
            let name = handle.name().clone();
            match handle.release() {
                Ok(()) => tracing::trace!(resource = %name, "released cursor resource"),
                Err(error) => {
                    failures += 1;
                    tracing::warn!(resource = %name, %error, "failed to release cursor resource");
                }
            }
        }
        failures
    }
}
