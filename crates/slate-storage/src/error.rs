use thiserror::Error;

use crate::types::{ChunkId, ChunkOffset, ColumnId, DataType, Value, ValueId};

/// Errors surfaced by the storage layer. All of them are fatal to the
/// current operation; nothing is retried internally.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum StorageError {
    #[error("unknown column type name: {name}")]
    UnknownType { name: String },
    #[error("no table named {name}")]
    UnknownTable { name: String },
    #[error("a table named {name} already exists")]
    DuplicateTable { name: String },
    #[error("invalid column name: {name}")]
    InvalidColumnName { name: String },
    #[error("chunk id {chunk_id} is out of range (table has {chunk_count} chunks)")]
    InvalidChunkId { chunk_id: ChunkId, chunk_count: usize },
    #[error("column id {column_id} is out of range (table has {column_count} columns)")]
    InvalidColumnId {
        column_id: ColumnId,
        column_count: usize,
    },
    #[error("index {index} is out of bounds (length {len})")]
    OutOfBounds { index: usize, len: usize },
    #[error("value id {value_id} is not backed by the dictionary ({unique_values} entries)")]
    InvalidValueId {
        value_id: ValueId,
        unique_values: usize,
    },
    #[error("columns can only be added while the table is empty")]
    NotEmpty,
    #[error("row has {actual} values but the table has {expected} columns")]
    Arity { expected: usize, actual: usize },
    #[error("value {value} does not match column type {expected}")]
    TypeMismatch { expected: DataType, value: Value },
    #[error("cannot store NULL in a non-nullable segment")]
    NotNullable,
    #[error("value at offset {offset} is NULL")]
    NullAccess { offset: ChunkOffset },
    #[error("value id {value_id} does not fit the attribute vector width")]
    Overflow { value_id: ValueId },
    #[error("column limit reached")]
    TooManyColumns,
    #[error("chunk limit reached")]
    TooManyChunks,
    #[error("chunk holds a compressed or reference segment; rows can only be appended to value segments")]
    NotValueSegment,
}
