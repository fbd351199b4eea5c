//! The mutable, uncompressed segment representation: a dense value vector
//! plus an optional null bitmap.

use std::sync::RwLock;

use crate::error::StorageError;
use crate::types::{ChunkOffset, ColumnValue, Value};

/// One chunk's worth of one column, stored as plain values.
///
/// Value segments are the only segment representation that accepts appends.
/// They sit behind shared handles (chunks hand them out while rows keep
/// arriving), so the payload lives behind an `RwLock` and `append` takes
/// `&self`. Null cells store the element default in the value vector; the
/// bitmap is what distinguishes them. Non-nullable segments carry no bitmap
/// at all.
#[derive(Debug)]
pub struct ValueSegment<T> {
    nullable: bool,
    inner: RwLock<Inner<T>>,
}

#[derive(Debug)]
struct Inner<T> {
    values: Vec<T>,
    nulls: Option<Vec<bool>>,
}

impl<T: ColumnValue> ValueSegment<T> {
    pub fn new(nullable: bool) -> Self {
        Self {
            nullable,
            inner: RwLock::new(Inner {
                values: Vec::new(),
                nulls: nullable.then(Vec::new),
            }),
        }
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Check whether `value` could be appended, without appending it. Rows
    /// are validated cell by cell through this before any segment is
    /// touched, so a bad cell never leaves a chunk's columns with unequal
    /// lengths.
    pub fn check_append(&self, value: &Value) -> Result<(), StorageError> {
        if value.is_null() {
            if !self.nullable {
                return Err(StorageError::NotNullable);
            }
            return Ok(());
        }
        T::from_value(value).map(drop)
    }

    /// Append one cell. NULL needs a nullable segment; anything else must
    /// carry exactly the segment's element type.
    pub fn append(&self, value: &Value) -> Result<(), StorageError> {
        if value.is_null() {
            if !self.nullable {
                return Err(StorageError::NotNullable);
            }
            let mut inner = self.write();
            inner.values.push(T::default());
            if let Some(nulls) = inner.nulls.as_mut() {
                nulls.push(true);
            }
            return Ok(());
        }

        let typed = T::from_value(value)?;
        let mut inner = self.write();
        inner.values.push(typed);
        if let Some(nulls) = inner.nulls.as_mut() {
            nulls.push(false);
        }
        Ok(())
    }

    pub fn size(&self) -> usize {
        self.read().values.len()
    }

    pub fn is_null(&self, offset: ChunkOffset) -> Result<bool, StorageError> {
        let inner = self.read();
        inner.check_bounds(offset)?;
        Ok(inner.is_null(offset))
    }

    /// The typed value at `offset`. Fails on NULL cells.
    pub fn get(&self, offset: ChunkOffset) -> Result<T, StorageError> {
        let inner = self.read();
        inner.check_bounds(offset)?;
        if inner.is_null(offset) {
            return Err(StorageError::NullAccess { offset });
        }
        Ok(inner.values[offset as usize].clone())
    }

    /// The typed value at `offset`, with NULL mapped to `None`.
    pub fn get_typed_value(&self, offset: ChunkOffset) -> Result<Option<T>, StorageError> {
        let inner = self.read();
        inner.check_bounds(offset)?;
        if inner.is_null(offset) {
            return Ok(None);
        }
        Ok(Some(inner.values[offset as usize].clone()))
    }

    /// The cell at `offset` as a polymorphic value.
    pub fn at(&self, offset: ChunkOffset) -> Result<Value, StorageError> {
        Ok(match self.get_typed_value(offset)? {
            Some(value) => value.into_value(),
            None => Value::Null,
        })
    }

    /// Snapshot of the value vector (null cells read as the element default).
    pub fn values(&self) -> Vec<T> {
        self.read().values.clone()
    }

    /// Snapshot of the null bitmap. Only nullable segments have one.
    pub fn null_values(&self) -> Result<Vec<bool>, StorageError> {
        match self.read().nulls.as_ref() {
            Some(nulls) => Ok(nulls.clone()),
            None => Err(StorageError::NotNullable),
        }
    }

    pub fn estimate_memory_usage(&self) -> usize {
        let inner = self.read();
        let nulls = inner.nulls.as_ref().map_or(0, Vec::len);
        std::mem::size_of::<T>() * inner.values.len() + nulls
    }

    /// Run `f` against a coherent view of values and nulls, under one lock
    /// acquisition. Dictionary construction reads through this so the two
    /// vectors cannot be observed mid-append.
    pub(crate) fn with_contents<R>(&self, f: impl FnOnce(&[T], Option<&[bool]>) -> R) -> R {
        let inner = self.read();
        f(&inner.values, inner.nulls.as_deref())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner<T>> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner<T>> {
        self.inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T> Inner<T> {
    fn check_bounds(&self, offset: ChunkOffset) -> Result<(), StorageError> {
        if offset as usize >= self.values.len() {
            return Err(StorageError::OutOfBounds {
                index: offset as usize,
                len: self.values.len(),
            });
        }
        Ok(())
    }

    fn is_null(&self, offset: ChunkOffset) -> bool {
        self.nulls
            .as_ref()
            .is_some_and(|nulls| nulls[offset as usize])
    }
}
