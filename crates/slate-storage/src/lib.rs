//! Chunked columnar storage for Slate.
//!
//! This crate covers:
//! - Tables split into row-horizontal chunks, one typed segment per column.
//! - Three interchangeable segment representations: mutable value segments,
//!   dictionary-compressed segments, and zero-copy reference segments.
//! - In-place chunk compression (one worker per column) that stays safe
//!   against concurrent appends and readers via shared chunk ownership.
//! - A named-table catalog for embedders.

#![forbid(unsafe_code)]

mod attribute_vector;
mod catalog;
mod chunk;
mod dictionary_segment;
mod error;
mod reference_segment;
mod segment;
mod table;
mod types;
mod value_segment;

pub use crate::attribute_vector::AttributeVector;
pub use crate::catalog::Catalog;
pub use crate::chunk::Chunk;
pub use crate::dictionary_segment::DictionarySegment;
pub use crate::error::StorageError;
pub use crate::reference_segment::ReferenceSegment;
pub use crate::segment::{DictionarySegmentRef, Segment, ValueSegmentRef};
pub use crate::table::{Table, DEFAULT_TARGET_CHUNK_SIZE};
pub use crate::types::{
    ChunkId, ChunkOffset, ColumnId, ColumnValue, DataType, PosList, RowId, Value, ValueId,
    INVALID_CHUNK_ID, INVALID_CHUNK_OFFSET, INVALID_VALUE_ID, NULL_ROW_ID, NULL_VALUE_ID,
};
pub use crate::value_segment::ValueSegment;
