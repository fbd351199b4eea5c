//! The operator framework: nodes with up to two inputs, one output table,
//! and single-shot execution.

use std::sync::{Arc, OnceLock};

use thiserror::Error;

use slate_storage::{StorageError, Table};

#[derive(Clone, Debug, PartialEq, Error)]
pub enum OperatorError {
    #[error("operator output requested before execute() completed")]
    NotExecuted,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A node of the (sequential, single-threaded) operator graph.
///
/// `execute` runs the operator once; running it again is a no-op and keeps
/// the first result. `output` hands out the produced table, and fails with
/// [`OperatorError::NotExecuted`] until an `execute` has completed. Inputs
/// are held as shared `Arc<dyn Operator>` handles, so a downstream operator
/// keeps its upstream (and its upstream's output) alive.
pub trait Operator: Send + Sync {
    fn execute(&self) -> Result<(), OperatorError>;

    fn output(&self) -> Result<Arc<Table>, OperatorError>;
}

/// Write-once slot for an operator's result table.
///
/// Concrete operators embed one of these and route both trait methods
/// through it, which is what makes `execute` idempotent.
#[derive(Debug, Default)]
pub struct OutputSlot {
    table: OnceLock<Arc<Table>>,
}

impl OutputSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_filled(&self) -> bool {
        self.table.get().is_some()
    }

    /// Store the result. The first fill wins; later fills are dropped.
    pub fn fill(&self, table: Arc<Table>) {
        let _ = self.table.set(table);
    }

    pub fn get(&self) -> Result<Arc<Table>, OperatorError> {
        self.table
            .get()
            .cloned()
            .ok_or(OperatorError::NotExecuted)
    }
}
