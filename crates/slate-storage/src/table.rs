//! Tables: schema, ordered chunks, row appends, and in-place dictionary
//! compression.

use std::sync::{Arc, Mutex, RwLock};

use tracing::debug;

use crate::chunk::Chunk;
use crate::error::StorageError;
use crate::segment::{Segment, ValueSegmentRef};
use crate::types::{ChunkId, ChunkOffset, ColumnId, DataType, Value};

/// Target chunk size used by [`Table::default`].
pub const DEFAULT_TARGET_CHUNK_SIZE: ChunkOffset = 65_535;

/// A named-schema table over a sequence of chunks.
///
/// Only the last chunk accepts rows; appending to a full tail creates a new
/// chunk first. A table is either fully materialized (value and dictionary
/// segments) or fully derived (reference segments built by a scan), never a
/// mix.
///
/// Chunks sit behind `Arc`, so a handle from [`Table::get_chunk`] stays
/// readable even after [`Table::compress_chunk`] swaps the slot to the
/// compressed chunk; the old chunk simply lives until its last reader drops
/// it. The `chunk_access_lock` serializes the mutating paths (appends and
/// the compression swap) against each other; reads never take it.
#[derive(Debug)]
pub struct Table {
    target_chunk_size: ChunkOffset,
    column_names: Vec<String>,
    column_types: Vec<DataType>,
    column_nullables: Vec<bool>,
    chunks: RwLock<Vec<Arc<Chunk>>>,
    chunk_access_lock: Mutex<()>,
}

impl Table {
    /// A fresh table with no columns and one empty chunk.
    pub fn new(target_chunk_size: ChunkOffset) -> Self {
        assert!(target_chunk_size > 0, "target chunk size must be positive");
        Self {
            target_chunk_size,
            column_names: Vec::new(),
            column_types: Vec::new(),
            column_nullables: Vec::new(),
            chunks: RwLock::new(vec![Arc::new(Chunk::new())]),
            chunk_access_lock: Mutex::new(()),
        }
    }

    /// A table with `schema_source`'s schema and the given chunks instead of
    /// the default empty one. Scans use this to assemble their outputs.
    pub fn from_chunks(schema_source: &Table, chunks: Vec<Arc<Chunk>>) -> Self {
        assert!(!chunks.is_empty(), "a table holds at least one chunk");
        Self {
            target_chunk_size: schema_source.target_chunk_size,
            column_names: schema_source.column_names.clone(),
            column_types: schema_source.column_types.clone(),
            column_nullables: schema_source.column_nullables.clone(),
            chunks: RwLock::new(chunks),
            chunk_access_lock: Mutex::new(()),
        }
    }

    /// Register a column. Only possible while the table is a single empty
    /// chunk, before the first append.
    pub fn add_column(
        &mut self,
        name: &str,
        type_name: &str,
        nullable: bool,
    ) -> Result<(), StorageError> {
        let data_type = DataType::from_name(type_name)?;
        if self.row_count() > 0 || self.chunk_count() > 1 {
            return Err(StorageError::NotEmpty);
        }
        if self.column_names.iter().any(|existing| existing == name) {
            return Err(StorageError::InvalidColumnName {
                name: name.to_owned(),
            });
        }
        if self.column_names.len() >= ColumnId::MAX as usize {
            return Err(StorageError::TooManyColumns);
        }

        self.column_names.push(name.to_owned());
        self.column_types.push(data_type);
        self.column_nullables.push(nullable);

        // The single chunk is empty, so rebuilding it is equivalent to
        // extending it in place.
        let chunk = self.empty_chunk()?;
        self.write_chunks()[0] = Arc::new(chunk);
        Ok(())
    }

    /// Append one row to the tail chunk, opening a new chunk first when the
    /// tail is full.
    pub fn append(&self, values: &[Value]) -> Result<(), StorageError> {
        if values.len() != self.column_count() {
            return Err(StorageError::Arity {
                expected: self.column_count(),
                actual: values.len(),
            });
        }

        let _guard = self
            .chunk_access_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut tail = self.tail_chunk();
        if tail.size() >= self.target_chunk_size as usize {
            self.create_new_chunk()?;
            tail = self.tail_chunk();
        }
        tail.append(values)
    }

    /// Open a fresh, empty tail chunk with one value segment per column.
    pub fn create_new_chunk(&self) -> Result<(), StorageError> {
        let chunk = Arc::new(self.empty_chunk()?);
        let mut chunks = self.write_chunks();
        if chunks.len() >= ChunkId::MAX as usize {
            return Err(StorageError::TooManyChunks);
        }
        chunks.push(chunk);
        Ok(())
    }

    /// Replace the chunk at `chunk_id` with its dictionary-compressed
    /// equivalent, building the segments on one rayon worker per column.
    ///
    /// The tail is rolled over *before* the lock is taken, so rows arriving
    /// during compression land in the fresh tail instead of racing the swap.
    /// Readers holding the old chunk keep a consistent view through their
    /// `Arc`.
    pub fn compress_chunk(&self, chunk_id: ChunkId) -> Result<(), StorageError> {
        if chunk_id as usize == self.chunk_count() - 1 {
            self.create_new_chunk()?;
        }

        let _guard = self
            .chunk_access_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let chunk = self.get_chunk(chunk_id)?;
        let mut results: Vec<Option<Result<Segment, StorageError>>> =
            vec![None; chunk.column_count()];
        rayon::scope(|scope| {
            for (result, segment) in results.iter_mut().zip(chunk.segments()) {
                let segment = segment.clone();
                scope.spawn(move |_| {
                    *result = Some(match segment {
                        Segment::Value(seg) => Ok(Segment::Dictionary(seg.compress())),
                        _ => Err(StorageError::NotValueSegment),
                    });
                });
            }
        });

        let mut compressed = Chunk::new();
        for result in results {
            let segment = match result {
                Some(segment) => segment?,
                None => unreachable!("the scope joins every worker"),
            };
            compressed.add_segment(segment)?;
        }

        debug!(
            chunk_id,
            rows = compressed.size(),
            columns = compressed.column_count(),
            "compressed chunk"
        );
        self.write_chunks()[chunk_id as usize] = Arc::new(compressed);
        Ok(())
    }

    pub fn column_count(&self) -> usize {
        self.column_names.len()
    }

    /// Total rows across all chunks.
    pub fn row_count(&self) -> usize {
        self.read_chunks().iter().map(|chunk| chunk.size()).sum()
    }

    pub fn chunk_count(&self) -> usize {
        self.read_chunks().len()
    }

    pub fn target_chunk_size(&self) -> ChunkOffset {
        self.target_chunk_size
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn column_id_by_name(&self, name: &str) -> Result<ColumnId, StorageError> {
        self.column_names
            .iter()
            .position(|existing| existing == name)
            .map(|index| index as ColumnId)
            .ok_or_else(|| StorageError::InvalidColumnName {
                name: name.to_owned(),
            })
    }

    pub fn column_name(&self, column_id: ColumnId) -> Result<&str, StorageError> {
        self.check_column_id(column_id)?;
        Ok(&self.column_names[column_id as usize])
    }

    pub fn column_type(&self, column_id: ColumnId) -> Result<DataType, StorageError> {
        self.check_column_id(column_id)?;
        Ok(self.column_types[column_id as usize])
    }

    pub fn column_nullable(&self, column_id: ColumnId) -> Result<bool, StorageError> {
        self.check_column_id(column_id)?;
        Ok(self.column_nullables[column_id as usize])
    }

    /// Shared handle to the chunk at `chunk_id`. The handle stays valid (and
    /// immutable from the holder's point of view) across later compression
    /// of that slot.
    pub fn get_chunk(&self, chunk_id: ChunkId) -> Result<Arc<Chunk>, StorageError> {
        let chunks = self.read_chunks();
        chunks
            .get(chunk_id as usize)
            .cloned()
            .ok_or(StorageError::InvalidChunkId {
                chunk_id,
                chunk_count: chunks.len(),
            })
    }

    fn empty_chunk(&self) -> Result<Chunk, StorageError> {
        let mut chunk = Chunk::new();
        for (data_type, &nullable) in self.column_types.iter().zip(&self.column_nullables) {
            chunk.add_segment(Segment::Value(ValueSegmentRef::new(*data_type, nullable)))?;
        }
        Ok(chunk)
    }

    fn tail_chunk(&self) -> Arc<Chunk> {
        let chunks = self.read_chunks();
        Arc::clone(chunks.last().expect("a table holds at least one chunk"))
    }

    fn check_column_id(&self, column_id: ColumnId) -> Result<(), StorageError> {
        if column_id as usize >= self.column_count() {
            return Err(StorageError::InvalidColumnId {
                column_id,
                column_count: self.column_count(),
            });
        }
        Ok(())
    }

    fn read_chunks(&self) -> std::sync::RwLockReadGuard<'_, Vec<Arc<Chunk>>> {
        self.chunks
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_chunks(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Arc<Chunk>>> {
        self.chunks
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_CHUNK_SIZE)
    }
}
