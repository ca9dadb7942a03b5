//! Per-request store of the widths measured in the first pass.
//!
//! The measurement pass holds a write-only [RegistryRecorder]; finishing it
//! yields a read-only [Registry] for the rendering pass. Neither type offers
//! the other half of the interface, so the rendering pass cannot record and
//! the measurement pass cannot read.

use crate::layout::WidthObserver;
use crate::units::Pt;
use indexmap::IndexMap;

/// What inside a table a measurement belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Slot {
    /// The table as a whole
    Table,
    /// One leaf column, by its key in the column tree
    Column(String),
}

/// Identifies one measured render node: a table, or a column of a table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistryKey {
    pub table: String,
    pub slot: Slot,
}

impl RegistryKey {
    pub fn table<S: Into<String>>(table: S) -> RegistryKey {
        RegistryKey {
            table: table.into(),
            slot: Slot::Table,
        }
    }

    pub fn column<S: Into<String>, C: Into<String>>(table: S, column: C) -> RegistryKey {
        RegistryKey {
            table: table.into(),
            slot: Slot::Column(column.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Entry {
    width: Option<Pt>,
    columns: IndexMap<String, Option<Pt>>,
}

/// Collects table and column registrations and their measured widths
#[derive(Debug, Default)]
pub struct RegistryRecorder {
    tables: IndexMap<String, Entry>,
}

impl RegistryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table; registering it again keeps its columns
    pub fn register_table(&mut self, table: &str) {
        if !self.tables.contains_key(table) {
            self.tables.insert(table.to_string(), Entry::default());
        }
    }

    /// Register a leaf column in left-to-right order. Columns already
    /// registered keep their position.
    pub fn register_column(&mut self, table: &str, column: &str) {
        self.register_table(table);
        if let Some(entry) = self.tables.get_mut(table) {
            if !entry.columns.contains_key(column) {
                entry.columns.insert(column.to_string(), None);
            }
        }
    }

    /// Freeze the recorded measurements. Registered nodes that were never
    /// measured count as zero width.
    pub fn finish(self) -> Registry {
        let tables = self
            .tables
            .into_iter()
            .map(|(table, entry)| {
                let measured = MeasuredTable {
                    width: entry.width.unwrap_or_default(),
                    columns: entry
                        .columns
                        .into_iter()
                        .map(|(column, width)| (column, width.unwrap_or_default()))
                        .collect(),
                };
                (table, measured)
            })
            .collect();
        Registry { tables }
    }
}

impl WidthObserver for RegistryRecorder {
    /// Only registered nodes are recorded; a later measurement replaces an earlier one
    fn observe(&mut self, key: &RegistryKey, width: Pt) {
        let Some(entry) = self.tables.get_mut(&key.table) else {
            return;
        };
        match &key.slot {
            Slot::Table => entry.width = Some(width),
            Slot::Column(column) => {
                if let Some(slot) = entry.columns.get_mut(column) {
                    *slot = Some(width);
                }
            }
        }
    }
}

/// Measured widths of one table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasuredTable {
    pub width: Pt,
    /// Leaf columns in registration order
    pub columns: IndexMap<String, Pt>,
}

impl MeasuredTable {
    pub fn column_widths(&self) -> Vec<Pt> {
        self.columns.values().copied().collect()
    }
}

/// Read-only measurements consulted by the rendering pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    tables: IndexMap<String, MeasuredTable>,
}

impl Registry {
    pub fn table(&self, table: &str) -> Option<&MeasuredTable> {
        self.tables.get(table)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
