//! Query operators over [`slate_storage`] tables.
//!
//! An operator is a graph node with up to two inputs and one output table.
//! Execution is single-shot and idempotent: `execute` computes the output
//! once, `output` hands it out from then on. The graph itself runs
//! sequentially; the only internal parallelism in the engine lives below
//! this crate, in chunk compression.

#![forbid(unsafe_code)]

mod get_table;
mod operator;
mod table_scan;

pub use crate::get_table::GetTable;
pub use crate::operator::{Operator, OperatorError, OutputSlot};
pub use crate::table_scan::{CmpOp, TableScan};
