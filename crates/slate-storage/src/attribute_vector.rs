//! Fixed-width storage for value ids, with the width chosen by dictionary
//! cardinality.

use crate::error::StorageError;
use crate::types::{ValueId, NULL_VALUE_ID};

/// An array of value ids where every entry has the same byte width.
///
/// The width is picked at construction and never changes: the smallest of
/// `u8`/`u16`/`u32` that can hold every dictionary slot *plus* the reserved
/// null sentinel. The sentinel is always the width's maximum value, so a
/// dictionary of exactly 256 entries already needs 16-bit entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttributeVector {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl AttributeVector {
    /// Build a vector sized for a dictionary with `unique_values` entries
    /// from pre-computed value ids. The input is complete up front, so the
    /// vector never has to grow.
    ///
    /// Ids equal to [`NULL_VALUE_ID`] are stored as the width's own null
    /// sentinel; any other id that exceeds the width fails with `Overflow`.
    pub fn from_value_ids(
        value_ids: &[ValueId],
        unique_values: usize,
    ) -> Result<Self, StorageError> {
        fn narrow<T: TryFrom<ValueId>>(
            value_ids: &[ValueId],
            max: ValueId,
        ) -> Result<Vec<T>, StorageError> {
            value_ids
                .iter()
                .map(|&value_id| {
                    let stored = if value_id == NULL_VALUE_ID {
                        max
                    } else if value_id > max {
                        return Err(StorageError::Overflow { value_id });
                    } else {
                        value_id
                    };
                    Ok(T::try_from(stored).unwrap_or_else(|_| unreachable!()))
                })
                .collect()
        }

        if unique_values < u8::MAX as usize + 1 {
            Ok(Self::U8(narrow(value_ids, u8::MAX as ValueId)?))
        } else if unique_values < u16::MAX as usize + 1 {
            Ok(Self::U16(narrow(value_ids, u16::MAX as ValueId)?))
        } else {
            Ok(Self::U32(narrow(value_ids, u32::MAX)?))
        }
    }

    pub fn get(&self, index: usize) -> Result<ValueId, StorageError> {
        self.check_bounds(index)?;
        Ok(match self {
            Self::U8(values) => values[index] as ValueId,
            Self::U16(values) => values[index] as ValueId,
            Self::U32(values) => values[index],
        })
    }

    /// Overwrite the id at `index`. [`NULL_VALUE_ID`] is stored as the
    /// width's null sentinel; other ids above the width fail with
    /// `Overflow`.
    pub fn set(&mut self, index: usize, value_id: ValueId) -> Result<(), StorageError> {
        self.check_bounds(index)?;
        let max = self.null_value_id();
        let stored = if value_id == NULL_VALUE_ID {
            max
        } else if value_id > max {
            return Err(StorageError::Overflow { value_id });
        } else {
            value_id
        };
        match self {
            Self::U8(values) => values[index] = stored as u8,
            Self::U16(values) => values[index] = stored as u16,
            Self::U32(values) => values[index] = stored,
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        match self {
            Self::U8(values) => values.len(),
            Self::U16(values) => values.len(),
            Self::U32(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entry width in bytes: 1, 2, or 4.
    pub fn width(&self) -> u8 {
        match self {
            Self::U8(_) => 1,
            Self::U16(_) => 2,
            Self::U32(_) => 4,
        }
    }

    /// The id this vector stores for NULL cells: the width's maximum.
    pub fn null_value_id(&self) -> ValueId {
        match self {
            Self::U8(_) => u8::MAX as ValueId,
            Self::U16(_) => u16::MAX as ValueId,
            Self::U32(_) => u32::MAX,
        }
    }

    fn check_bounds(&self, index: usize) -> Result<(), StorageError> {
        let len = self.len();
        if index >= len {
            return Err(StorageError::OutOfBounds { index, len });
        }
        Ok(())
    }
}
