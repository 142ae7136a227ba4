//! Name-based table registry.
//!
//! Reference segments keep their base table alive through `Arc`; the
//! registry exists so collaborators (planners, operators) resolve tables
//! by name without any process-wide singleton — it lives inside the
//! engine context and is passed around explicitly.

use std::sync::Arc;

use tessera_common::collections::{tessera_concurrent_map, TesseraConcurrentMap};

use super::table::Table;

/// A concurrent name → table map.
pub struct TableRegistry {
    tables: TesseraConcurrentMap<String, Arc<Table>>,
}

impl TableRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: tessera_concurrent_map(),
        }
    }

    /// Registers a table under a name.
    ///
    /// # Panics
    /// Panics if the name is already taken.
    pub fn add_table(&self, name: impl Into<String>, table: Arc<Table>) {
        let name = name.into();
        let previous = self.tables.insert(name.clone(), table);
        assert!(previous.is_none(), "a table named '{name}' already exists");
    }

    /// Looks up a table by name.
    #[must_use]
    pub fn get_table(&self, name: &str) -> Option<Arc<Table>> {
        self.tables.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Returns whether a table is registered under the name.
    #[must_use]
    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Unregisters a table.
    ///
    /// # Panics
    /// Panics if no table carries that name.
    pub fn drop_table(&self, name: &str) {
        let removed = self.tables.remove(name);
        assert!(removed.is_some(), "no table named '{name}' to drop");
    }

    /// All registered names, in no particular order.
    #[must_use]
    pub fn table_names(&self) -> Vec<String> {
        self.tables.iter().map(|entry| entry.key().clone()).collect()
    }
}

impl Default for TableRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::table::{ColumnDefinition, TableKind};
    use tessera_common::types::DataType;

    fn table() -> Arc<Table> {
        Arc::new(Table::new(
            vec![ColumnDefinition::new("a", DataType::Int64, false)],
            TableKind::Data,
        ))
    }

    #[test]
    fn test_add_get_drop() {
        let registry = TableRegistry::new();
        registry.add_table("t", table());
        assert!(registry.has_table("t"));
        assert!(registry.get_table("t").is_some());
        assert_eq!(registry.table_names(), vec!["t".to_string()]);

        registry.drop_table("t");
        assert!(registry.get_table("t").is_none());
    }

    #[test]
    #[should_panic(expected = "already exists")]
    fn test_duplicate_name_panics() {
        let registry = TableRegistry::new();
        registry.add_table("t", table());
        registry.add_table("t", table());
    }
}
