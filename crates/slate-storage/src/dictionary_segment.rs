//! The compressed, immutable segment representation: a sorted dictionary of
//! distinct values plus a fixed-width attribute vector.

use std::cmp::Ordering;

use crate::attribute_vector::AttributeVector;
use crate::error::StorageError;
use crate::types::{ChunkOffset, ColumnValue, Value, ValueId, INVALID_VALUE_ID};
use crate::value_segment::ValueSegment;

/// Dictionary-encoded form of a [`ValueSegment`].
///
/// The dictionary holds the segment's distinct non-null values in ascending
/// order; the attribute vector holds one value id per row. NULL never enters
/// the dictionary: null rows carry the attribute vector's reserved null id.
/// Once built, the segment is immutable.
#[derive(Clone, Debug)]
pub struct DictionarySegment<T> {
    dictionary: Vec<T>,
    attribute_vector: AttributeVector,
}

impl<T: ColumnValue> DictionarySegment<T> {
    /// Compress a value segment.
    ///
    /// The distinct non-null values are sorted and deduplicated into the
    /// dictionary, then every row is re-encoded as an index into it in a
    /// single pass. The attribute-vector width is the smallest that fits
    /// both the dictionary and the null sentinel.
    pub fn from_value_segment(segment: &ValueSegment<T>) -> Self {
        segment.with_contents(|values, nulls| {
            let mut dictionary: Vec<T> = match nulls {
                Some(nulls) => values
                    .iter()
                    .zip(nulls)
                    .filter(|&(_, &is_null)| !is_null)
                    .map(|(value, _)| value.clone())
                    .collect(),
                None => values.to_vec(),
            };
            dictionary.sort_by(|a, b| a.total_cmp(b));
            dictionary.dedup_by(|a, b| a.total_cmp(b) == Ordering::Equal);
            dictionary.shrink_to_fit();

            let is_null = |row: usize| nulls.is_some_and(|nulls| nulls[row]);
            let value_ids: Vec<ValueId> = values
                .iter()
                .enumerate()
                .map(|(row, value)| {
                    if is_null(row) {
                        return INVALID_VALUE_ID;
                    }
                    match dictionary.binary_search_by(|probe| probe.total_cmp(value)) {
                        Ok(id) => id as ValueId,
                        Err(_) => unreachable!("dictionary holds every non-null input value"),
                    }
                })
                .collect();

            let attribute_vector = AttributeVector::from_value_ids(&value_ids, dictionary.len())
                .unwrap_or_else(|_| {
                    unreachable!("every id indexes the dictionary the width was chosen for")
                });

            Self {
                dictionary,
                attribute_vector,
            }
        })
    }

    pub fn size(&self) -> usize {
        self.attribute_vector.len()
    }

    /// Distinct non-null values, ascending.
    pub fn dictionary(&self) -> &[T] {
        &self.dictionary
    }

    pub fn attribute_vector(&self) -> &AttributeVector {
        &self.attribute_vector
    }

    /// The id this segment's attribute vector stores for NULL rows.
    pub fn null_value_id(&self) -> ValueId {
        self.attribute_vector.null_value_id()
    }

    pub fn unique_values_count(&self) -> usize {
        self.dictionary.len()
    }

    pub fn value_of_value_id(&self, value_id: ValueId) -> Result<&T, StorageError> {
        self.dictionary
            .get(value_id as usize)
            .ok_or(StorageError::InvalidValueId {
                value_id,
                unique_values: self.dictionary.len(),
            })
    }

    /// The typed value at `offset`. Fails on NULL rows.
    pub fn get(&self, offset: ChunkOffset) -> Result<T, StorageError> {
        match self.get_typed_value(offset)? {
            Some(value) => Ok(value),
            None => Err(StorageError::NullAccess { offset }),
        }
    }

    /// The typed value at `offset`, with NULL mapped to `None`.
    pub fn get_typed_value(&self, offset: ChunkOffset) -> Result<Option<T>, StorageError> {
        let value_id = self.attribute_vector.get(offset as usize)?;
        if value_id == self.null_value_id() {
            return Ok(None);
        }
        Ok(Some(self.value_of_value_id(value_id)?.clone()))
    }

    /// The cell at `offset` as a polymorphic value.
    pub fn at(&self, offset: ChunkOffset) -> Result<Value, StorageError> {
        Ok(match self.get_typed_value(offset)? {
            Some(value) => value.into_value(),
            None => Value::Null,
        })
    }

    /// Id of the first dictionary entry `>= value`, or [`INVALID_VALUE_ID`]
    /// when every entry is smaller.
    pub fn lower_bound(&self, value: &T) -> ValueId {
        self.bound_to_value_id(
            self.dictionary
                .partition_point(|entry| entry.total_cmp(value) == Ordering::Less),
        )
    }

    /// Id of the first dictionary entry `> value`, or [`INVALID_VALUE_ID`]
    /// when every entry is `<= value`.
    pub fn upper_bound(&self, value: &T) -> ValueId {
        self.bound_to_value_id(
            self.dictionary
                .partition_point(|entry| entry.total_cmp(value) != Ordering::Greater),
        )
    }

    /// [`Self::lower_bound`] for a polymorphic cell; the cell must carry the
    /// segment's element type.
    pub fn lower_bound_value(&self, value: &Value) -> Result<ValueId, StorageError> {
        Ok(self.lower_bound(&T::from_value(value)?))
    }

    /// [`Self::upper_bound`] for a polymorphic cell.
    pub fn upper_bound_value(&self, value: &Value) -> Result<ValueId, StorageError> {
        Ok(self.upper_bound(&T::from_value(value)?))
    }

    pub fn estimate_memory_usage(&self) -> usize {
        self.attribute_vector.width() as usize * self.size()
            + std::mem::size_of::<T>() * self.dictionary.len()
    }

    fn bound_to_value_id(&self, index: usize) -> ValueId {
        if index >= self.dictionary.len() {
            INVALID_VALUE_ID
        } else {
            index as ValueId
        }
    }
}
