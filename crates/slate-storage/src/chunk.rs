//! A horizontal slice of a table: one segment per column, all the same
//! length.

use crate::error::StorageError;
use crate::segment::Segment;
use crate::types::{ColumnId, Value};

/// Ordered collection of segments forming one row range of a table.
///
/// Chunks are assembled column by column (`add_segment`) and then shared;
/// rows are appended through the segments' own interior mutability, so
/// `append` takes `&self`. Every segment has the same length at all times;
/// `append` writes one cell to each.
#[derive(Debug, Default)]
pub struct Chunk {
    segments: Vec<Segment>,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one segment as the next column.
    pub fn add_segment(&mut self, segment: Segment) -> Result<(), StorageError> {
        if self.segments.len() >= ColumnId::MAX as usize {
            return Err(StorageError::TooManyColumns);
        }
        self.segments.push(segment);
        Ok(())
    }

    /// Append one row, one cell per column. Every segment must still be a
    /// value segment; the cell type is checked by the segment it lands in.
    ///
    /// The whole row is validated before any segment is written. A mismatch
    /// found mid-row would otherwise leave earlier columns one cell longer
    /// than the rest, and segments have no way to take a cell back.
    pub fn append(&self, values: &[Value]) -> Result<(), StorageError> {
        if values.len() != self.segments.len() {
            return Err(StorageError::Arity {
                expected: self.segments.len(),
                actual: values.len(),
            });
        }

        for (segment, value) in self.segments.iter().zip(values) {
            match segment {
                Segment::Value(seg) => seg.check_append(value)?,
                _ => return Err(StorageError::NotValueSegment),
            }
        }
        for (segment, value) in self.segments.iter().zip(values) {
            if let Segment::Value(seg) = segment {
                seg.append(value)?;
            }
        }
        Ok(())
    }

    pub fn segment(&self, column_id: ColumnId) -> Result<&Segment, StorageError> {
        self.segments
            .get(column_id as usize)
            .ok_or(StorageError::InvalidColumnId {
                column_id,
                column_count: self.segments.len(),
            })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn column_count(&self) -> usize {
        self.segments.len()
    }

    /// Number of rows, read off the first segment.
    pub fn size(&self) -> usize {
        self.segments.first().map_or(0, Segment::size)
    }
}
