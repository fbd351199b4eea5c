//! Predicate scan: filter one column of a table and produce a table of
//! reference segments over the matching rows.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use slate_storage::{
    with_data_type, with_dictionary_segment, with_value_segment, Chunk, ChunkId, ChunkOffset,
    ColumnId, ColumnValue, DictionarySegment, PosList, ReferenceSegment, RowId, Segment,
    StorageError, Table, Value, ValueSegment,
};

use crate::operator::{Operator, OperatorError, OutputSlot};

/// The supported scan comparisons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CmpOp {
    /// Whether an ordering of `value` relative to the search value satisfies
    /// this comparison.
    pub fn matches(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Ne => ordering != Ordering::Equal,
            Self::Lt => ordering == Ordering::Less,
            Self::Lte => ordering != Ordering::Greater,
            Self::Gt => ordering == Ordering::Greater,
            Self::Gte => ordering != Ordering::Less,
        }
    }
}

/// Per-row match decision for one concrete segment. Built once per segment
/// and cached by segment identity; holds shared handles, so it outlives the
/// chunk walk that created it.
type Matcher = Box<dyn Fn(ChunkOffset) -> Result<bool, StorageError>>;

/// Filters the input table by `column_id <cmp_op> search_value`.
///
/// The output consists entirely of reference segments. A materialized input
/// is referenced directly; a derived input (itself all reference segments)
/// has its position lists translated so the output points straight at the
/// originally referenced table; indirection never stacks.
///
/// Row order is preserved, within chunks and across them. NULL cells never
/// match, regardless of the comparison.
pub struct TableScan {
    input: Arc<dyn Operator>,
    column_id: ColumnId,
    cmp_op: CmpOp,
    search_value: Value,
    output: OutputSlot,
}

impl TableScan {
    pub fn new(
        input: Arc<dyn Operator>,
        column_id: ColumnId,
        cmp_op: CmpOp,
        search_value: Value,
    ) -> Self {
        Self {
            input,
            column_id,
            cmp_op,
            search_value,
            output: OutputSlot::new(),
        }
    }

    pub fn column_id(&self) -> ColumnId {
        self.column_id
    }

    pub fn cmp_op(&self) -> CmpOp {
        self.cmp_op
    }

    pub fn search_value(&self) -> &Value {
        &self.search_value
    }

    /// Offsets of the rows in `chunk` whose predicate-column cell matches.
    ///
    /// Matchers are cached by segment identity: within one chunk of a
    /// materialized input the segment is examined once, and across a derived
    /// input many rows resolve into the same underlying segment.
    fn matching_offsets(
        &self,
        chunk: &Chunk,
        matchers: &mut HashMap<usize, Matcher>,
    ) -> Result<Vec<ChunkOffset>, OperatorError> {
        let segment = chunk.segment(self.column_id)?;
        let size = segment.size() as ChunkOffset;
        let mut offsets = Vec::new();

        match segment {
            Segment::Reference(reference) => {
                for offset in 0..size {
                    let row_id = reference.pos_list()[offset as usize];
                    if row_id.is_null() {
                        continue;
                    }
                    let underlying_chunk =
                        reference.referenced_table().get_chunk(row_id.chunk_id)?;
                    let underlying =
                        underlying_chunk.segment(reference.referenced_column_id())?;
                    let key = segment_identity(underlying);
                    if !matchers.contains_key(&key) {
                        matchers.insert(key, self.build_matcher(underlying)?);
                    }
                    if matchers[&key](row_id.chunk_offset)? {
                        offsets.push(offset);
                    }
                }
            }
            _ => {
                let key = segment_identity(segment);
                if !matchers.contains_key(&key) {
                    matchers.insert(key, self.build_matcher(segment)?);
                }
                let matcher = &matchers[&key];
                for offset in 0..size {
                    if matcher(offset)? {
                        offsets.push(offset);
                    }
                }
            }
        }
        Ok(offsets)
    }

    /// Resolve the segment's representation and element type once and close
    /// over everything the per-row decision needs.
    fn build_matcher(&self, segment: &Segment) -> Result<Matcher, OperatorError> {
        match segment {
            Segment::Value(seg) => Ok(with_value_segment!(seg, s => value_matcher(
                Arc::clone(s),
                self.cmp_op,
                &self.search_value,
            )?)),
            Segment::Dictionary(seg) => Ok(with_dictionary_segment!(seg, s => dictionary_matcher(
                Arc::clone(s),
                self.cmp_op,
                &self.search_value,
            )?)),
            // Reference segments are resolved row by row before matchers are
            // built, and the tables they point at are always materialized.
            Segment::Reference(_) => {
                unreachable!("reference segments never point at reference segments")
            }
        }
    }
}

impl Operator for TableScan {
    fn execute(&self) -> Result<(), OperatorError> {
        if self.output.is_filled() {
            return Ok(());
        }

        let input = self.input.output()?;
        let column_type = input.column_type(self.column_id)?;
        // Reject a search value of the wrong type up front, even if every
        // chunk turns out to be empty.
        with_data_type!(column_type, T => T::from_value(&self.search_value).map(drop))?;

        let derived = input_is_derived(&input)?;
        let mut matchers: HashMap<usize, Matcher> = HashMap::new();
        let mut translated: HashMap<usize, Arc<PosList>> = HashMap::new();
        let mut output_chunks: Vec<Arc<Chunk>> = Vec::new();

        for chunk_id in 0..input.chunk_count() as ChunkId {
            let chunk = input.get_chunk(chunk_id)?;
            let offsets = self.matching_offsets(&chunk, &mut matchers)?;
            trace!(chunk_id, matched = offsets.len(), rows = chunk.size(), "scanned chunk");
            if offsets.is_empty() {
                continue;
            }
            let output_chunk = if derived {
                derived_output_chunk(&chunk, &offsets, &mut translated)?
            } else {
                materialized_output_chunk(&input, &chunk, chunk_id, offsets)?
            };
            output_chunks.push(output_chunk);
        }

        // A miss on every chunk still yields a well-formed (derived, single
        // chunk, zero row) table.
        if output_chunks.is_empty() {
            output_chunks.push(empty_result_chunk(&input, derived)?);
        }

        let output = Table::from_chunks(&input, output_chunks);
        debug!(
            column_id = self.column_id,
            rows_in = input.row_count(),
            rows_out = output.row_count(),
            "table scan"
        );
        self.output.fill(Arc::new(output));
        Ok(())
    }

    fn output(&self) -> Result<Arc<Table>, OperatorError> {
        self.output.get()
    }
}

/// A stable per-scan key for a segment: the address of its payload.
fn segment_identity(segment: &Segment) -> usize {
    match segment {
        Segment::Value(seg) => with_value_segment!(seg, s => Arc::as_ptr(s) as usize),
        Segment::Dictionary(seg) => with_dictionary_segment!(seg, s => Arc::as_ptr(s) as usize),
        Segment::Reference(seg) => Arc::as_ptr(seg) as usize,
    }
}

fn value_matcher<T: ColumnValue>(
    segment: Arc<ValueSegment<T>>,
    cmp_op: CmpOp,
    search_value: &Value,
) -> Result<Matcher, StorageError> {
    let search = T::from_value(search_value)?;
    Ok(Box::new(move |offset| {
        if segment.is_null(offset)? {
            return Ok(false);
        }
        Ok(cmp_op.matches(segment.get(offset)?.total_cmp(&search)))
    }))
}

/// Dictionary segments are matched on value ids: the two dictionary bounds
/// of the search value are computed once, and each row costs one attribute
/// vector read plus an integer comparison.
fn dictionary_matcher<T: ColumnValue>(
    segment: Arc<DictionarySegment<T>>,
    cmp_op: CmpOp,
    search_value: &Value,
) -> Result<Matcher, StorageError> {
    let search = T::from_value(search_value)?;
    let low = segment.lower_bound(&search);
    let high = segment.upper_bound(&search);
    // Equal bounds mean the search value is absent from the dictionary.
    let present = low != high;
    let null_value_id = segment.null_value_id();

    Ok(Box::new(move |offset| {
        let value_id = segment.attribute_vector().get(offset as usize)?;
        // NULL rows never match, `Ne` included.
        if value_id == null_value_id {
            return Ok(false);
        }
        Ok(match cmp_op {
            CmpOp::Eq => present && value_id == low,
            CmpOp::Ne => !present || value_id != low,
            CmpOp::Lt => value_id < low,
            CmpOp::Lte => {
                if present {
                    value_id <= low
                } else {
                    value_id < low
                }
            }
            CmpOp::Gt => value_id >= high,
            CmpOp::Gte => value_id >= low,
        })
    }))
}

/// Whether the table is derived (all reference segments) rather than
/// materialized. Either way the property is table-wide, so inspecting one
/// segment of the first chunk that has any is enough.
fn input_is_derived(table: &Table) -> Result<bool, OperatorError> {
    for chunk_id in 0..table.chunk_count() as ChunkId {
        let chunk = table.get_chunk(chunk_id)?;
        if chunk.column_count() > 0 {
            return Ok(chunk.segment(0)?.is_reference());
        }
    }
    Ok(false)
}

/// Output chunk over a materialized input: one position list naming the
/// matching rows of this input chunk, shared by a reference segment per
/// column.
fn materialized_output_chunk(
    input: &Arc<Table>,
    chunk: &Chunk,
    chunk_id: ChunkId,
    offsets: Vec<ChunkOffset>,
) -> Result<Arc<Chunk>, OperatorError> {
    let pos_list: Arc<PosList> = Arc::new(
        offsets
            .into_iter()
            .map(|chunk_offset| RowId {
                chunk_id,
                chunk_offset,
            })
            .collect(),
    );

    let mut output = Chunk::new();
    for column_id in 0..chunk.column_count() as ColumnId {
        output.add_segment(Segment::Reference(Arc::new(ReferenceSegment::new(
            Arc::clone(input),
            column_id,
            Arc::clone(&pos_list),
        ))))?;
    }
    Ok(Arc::new(output))
}

/// Output chunk over a derived input: matching offsets are translated
/// through each column's source position list, so the result points at the
/// originally referenced table. Columns that shared a position list upstream
/// share the translated one.
fn derived_output_chunk(
    chunk: &Chunk,
    offsets: &[ChunkOffset],
    translated: &mut HashMap<usize, Arc<PosList>>,
) -> Result<Arc<Chunk>, OperatorError> {
    let mut output = Chunk::new();
    for segment in chunk.segments() {
        let Segment::Reference(source) = segment else {
            unreachable!("a derived table holds reference segments only");
        };
        let key = Arc::as_ptr(source.pos_list()) as usize;
        let pos_list = translated
            .entry(key)
            .or_insert_with(|| {
                let source_positions = source.pos_list();
                Arc::new(
                    offsets
                        .iter()
                        .map(|&offset| source_positions[offset as usize])
                        .collect(),
                )
            })
            .clone();
        output.add_segment(Segment::Reference(Arc::new(ReferenceSegment::new(
            Arc::clone(source.referenced_table()),
            source.referenced_column_id(),
            pos_list,
        ))))?;
    }
    Ok(Arc::new(output))
}

/// The all-miss result: one chunk of reference segments with empty position
/// lists, pointing wherever a non-empty result would have pointed.
fn empty_result_chunk(input: &Arc<Table>, derived: bool) -> Result<Arc<Chunk>, OperatorError> {
    let empty: Arc<PosList> = Arc::new(Vec::new());
    let mut output = Chunk::new();

    if derived {
        let first = input.get_chunk(0)?;
        for segment in first.segments() {
            let Segment::Reference(source) = segment else {
                unreachable!("a derived table holds reference segments only");
            };
            output.add_segment(Segment::Reference(Arc::new(ReferenceSegment::new(
                Arc::clone(source.referenced_table()),
                source.referenced_column_id(),
                Arc::clone(&empty),
            ))))?;
        }
    } else {
        for column_id in 0..input.column_count() as ColumnId {
            output.add_segment(Segment::Reference(Arc::new(ReferenceSegment::new(
                Arc::clone(input),
                column_id,
                Arc::clone(&empty),
            ))))?;
        }
    }
    Ok(Arc::new(output))
}
