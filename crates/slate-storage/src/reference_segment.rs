//! The indirect segment representation: a window onto rows of another table.

use std::sync::Arc;

use crate::error::StorageError;
use crate::table::Table;
use crate::types::{ChunkOffset, ColumnId, PosList, RowId, Value};

/// A segment that stores no values of its own, only positions.
///
/// Each entry of the position list names a row of the referenced table; reads
/// delegate to whatever segment holds that row. The referenced table must be
/// materialized (value or dictionary segments only, so a reference segment
/// never chains through another reference segment; scans enforce this), and
/// the position list must be valid against it when the segment is built.
///
/// Both the table and the position list sit behind `Arc`: the same list is
/// shared by every column segment produced by one scan, and the table must
/// outlive all views onto it.
#[derive(Clone, Debug)]
pub struct ReferenceSegment {
    referenced_table: Arc<Table>,
    referenced_column_id: ColumnId,
    pos_list: Arc<PosList>,
}

impl ReferenceSegment {
    pub fn new(
        referenced_table: Arc<Table>,
        referenced_column_id: ColumnId,
        pos_list: Arc<PosList>,
    ) -> Self {
        Self {
            referenced_table,
            referenced_column_id,
            pos_list,
        }
    }

    pub fn size(&self) -> usize {
        self.pos_list.len()
    }

    pub fn referenced_table(&self) -> &Arc<Table> {
        &self.referenced_table
    }

    pub fn referenced_column_id(&self) -> ColumnId {
        self.referenced_column_id
    }

    pub fn pos_list(&self) -> &Arc<PosList> {
        &self.pos_list
    }

    /// The cell at `offset`, read through the referenced table. The null row
    /// id resolves to NULL without touching the table.
    pub fn at(&self, offset: ChunkOffset) -> Result<Value, StorageError> {
        let row_id = self.row_id(offset)?;
        if row_id.is_null() {
            return Ok(Value::Null);
        }
        self.referenced_table
            .get_chunk(row_id.chunk_id)?
            .segment(self.referenced_column_id)?
            .at(row_id.chunk_offset)
    }

    pub(crate) fn row_id(&self, offset: ChunkOffset) -> Result<RowId, StorageError> {
        self.pos_list
            .get(offset as usize)
            .copied()
            .ok_or(StorageError::OutOfBounds {
                index: offset as usize,
                len: self.pos_list.len(),
            })
    }

    pub fn estimate_memory_usage(&self) -> usize {
        self.pos_list.capacity() * std::mem::size_of::<RowId>()
    }
}
