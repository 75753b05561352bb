//! The caller-supplied row conversion.

use crate::types::RowIndex;

/// Converts a raw row and its position into a caller-defined value.
///
/// Failures are the caller's business: the cursor relays them unchanged as
/// [`CursorError::Mapping`](crate::errors::CursorError::Mapping) and takes no
/// recovery action.
///
/// Any `FnMut(R, RowIndex) -> Result<T, E>` is a mapper, and so is a mutable
/// borrow of one, which lets a cursor use a mapper it does not own.
pub trait RowMapper<R> {
    /// Value produced for each row
    type Output;

    /// Error produced when a row cannot be converted
    type Error;

    /// Maps `row`, which is the `index`-th row handed to this mapper.
    fn map_row(&mut self, row: R, index: RowIndex) -> Result<Self::Output, Self::Error>;
}

impl<R, T, E, F> RowMapper<R> for F
where
    F: FnMut(R, RowIndex) -> Result<T, E>,
{
    type Output = T;
    type Error = E;

    fn map_row(&mut self, row: R, index: RowIndex) -> Result<T, E> {
        self(row, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn map_with<M: RowMapper<&'static str>>(
        mapper: &mut M,
        row: &'static str,
    ) -> Result<M::Output, M::Error> {
        mapper.map_row(row, RowIndex::new(7))
    }

    #[test]
    fn closures_are_mappers() {
        let mut upper = |row: &str, index: RowIndex| -> Result<String, Infallible> {
            Ok(format!("{}@{index}", row.to_uppercase()))
        };

        assert_eq!(map_with(&mut upper, "a").unwrap(), "A@7");
    }

    #[test]
    fn borrowed_closures_are_mappers() {
        let mut seen = Vec::new();
        let mut record = |row: &str, index: RowIndex| -> Result<usize, Infallible> {
            seen.push(u64::from(index));
            Ok(row.len())
        };

        {
            let mut borrowed = &mut record;
            assert_eq!(map_with(&mut borrowed, "abc").unwrap(), 3);
        }
        assert_eq!(seen, vec![7]);
    }
}
