//! rowcursor benchmarks
//!
//! Criterion benchmarks for pulling, mapping and releasing rows through a
//! `LazyResourceCursor`. Run them with `cargo bench -p rowcursor-benchmarks`.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
