//! The named-table registry.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::error::StorageError;
use crate::table::Table;

/// Name → table mapping for one embedding process.
///
/// The embedder constructs a catalog and threads a handle wherever tables
/// are looked up by name; there is no hidden global. Mutations are assumed
/// to be serialized by the embedder, but the map carries its own lock so
/// concurrent readers are safe regardless.
#[derive(Debug, Default)]
pub struct Catalog {
    tables: RwLock<BTreeMap<String, Arc<Table>>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(
        &self,
        name: impl Into<String>,
        table: Arc<Table>,
    ) -> Result<(), StorageError> {
        let name = name.into();
        let mut tables = self.write();
        if tables.contains_key(&name) {
            return Err(StorageError::DuplicateTable { name });
        }
        debug!(table = %name, "registered table");
        tables.insert(name, table);
        Ok(())
    }

    pub fn drop_table(&self, name: &str) -> Result<(), StorageError> {
        match self.write().remove(name) {
            Some(_) => {
                debug!(table = %name, "dropped table");
                Ok(())
            }
            None => Err(StorageError::UnknownTable {
                name: name.to_owned(),
            }),
        }
    }

    pub fn get_table(&self, name: &str) -> Result<Arc<Table>, StorageError> {
        self.read()
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::UnknownTable {
                name: name.to_owned(),
            })
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Registered names, ascending.
    pub fn table_names(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Drop every table.
    pub fn reset(&self) {
        debug!("reset catalog");
        self.write().clear();
    }

    /// One line per table: name, column count, row count, chunk count.
    pub fn print(&self, out: &mut dyn Write) -> io::Result<()> {
        for (name, table) in self.read().iter() {
            writeln!(
                out,
                "{name} ({} columns, {} rows, {} chunks)",
                table.column_count(),
                table.row_count(),
                table.chunk_count(),
            )?;
        }
        Ok(())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, Arc<Table>>> {
        self.tables
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, Arc<Table>>> {
        self.tables
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
