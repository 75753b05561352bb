//! Test doubles for `rowcursor`.
//!
//! - [`ReleaseLog`] records the order in which resources were released.
//! - [`TrackedResource`] counts its releases and can be made to fail.
//! - [`ScriptedRowSource`] replays rows and injected failures while counting
//!   pulls.
//! - [`ChaosRowSource`] wraps any row source and injects random failures.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(
    bad_style,
    rust_2018_idioms,
    unused_imports,
    unused_must_use,
    unused_mut,
    unused_variables
)]

pub mod chaos;
pub mod release_log;
pub mod resource;
pub mod source;

pub use chaos::*;
pub use release_log::ReleaseLog;
pub use resource::{ReleaseTracker, TrackedResource};
pub use source::{ScriptedRowError, ScriptedRowSource, SourceProbe};
