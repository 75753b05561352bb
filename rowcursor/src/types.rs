//! Identifier types used by the cursor and its diagnostics.
//!
//! All types use smart constructors so that a value, once built, is valid
//! everywhere it travels (log fields, leak reports, mapper arguments).

use nutype::nutype;
use uuid::Uuid;

/// Zero-based position of a row handed to a [`RowMapper`](crate::mapper::RowMapper).
///
/// A cursor starts at [`RowIndex::first`] and advances by exactly one for every
/// row it passes to its mapper. Indices are never reused.
#[nutype(derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    Into,
    Serialize,
    Deserialize
))]
pub struct RowIndex(u64);

impl RowIndex {
    /// The index of the first row (0).
    pub fn first() -> Self {
        Self::new(0)
    }

    /// Returns the index that follows this one.
    #[must_use]
    pub fn next(self) -> Self {
        Self::new(self.into_inner() + 1)
    }
}

/// Name of a resource handle owned by a cursor.
///
/// Names appear in the cursor's diagnostic output and in release-failure logs,
/// so they are trimmed, non-empty and at most 255 characters.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 255),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct ResourceName(String);

impl ResourceName {
    /// Default name given to a cursor's row source.
    pub fn row_source() -> Self {
        Self::try_new("row-source").expect("constant resource name is valid")
    }
}

/// Unique identity of a cursor, a `UUIDv7` so ids sort by creation time.
#[nutype(
    validate(predicate = |id: &Uuid| id.get_version() == Some(uuid::Version::SortRand)),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        AsRef,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct CursorId(Uuid);

impl CursorId {
    /// Generates a fresh id stamped with the current time.
    pub fn generate() -> Self {
        Self::try_new(Uuid::now_v7()).expect("Uuid::now_v7() is always a v7 UUID")
    }
}
