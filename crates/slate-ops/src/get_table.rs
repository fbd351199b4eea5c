//! Leaf operator that reads a named table from the catalog.

use std::sync::Arc;

use slate_storage::{Catalog, Table};

use crate::operator::{Operator, OperatorError, OutputSlot};

/// Resolves a table name against a [`Catalog`] handle. Has no inputs; the
/// retrieved table is the output as-is.
#[derive(Debug)]
pub struct GetTable {
    catalog: Arc<Catalog>,
    table_name: String,
    output: OutputSlot,
}

impl GetTable {
    pub fn new(catalog: Arc<Catalog>, table_name: impl Into<String>) -> Self {
        Self {
            catalog,
            table_name: table_name.into(),
            output: OutputSlot::new(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

impl Operator for GetTable {
    fn execute(&self) -> Result<(), OperatorError> {
        if self.output.is_filled() {
            return Ok(());
        }
        let table = self.catalog.get_table(&self.table_name)?;
        self.output.fill(table);
        Ok(())
    }

    fn output(&self) -> Result<Arc<Table>, OperatorError> {
        self.output.get()
    }
}
