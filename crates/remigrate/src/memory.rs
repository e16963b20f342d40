//! An in-memory [`Backend`].
//!
//! Keeps databases, tables and indexes in ordered maps, records every call
//! it receives, and can be told to fail specific calls. The test suites use
//! it to observe exactly what the engine asked for.

use std::collections::{BTreeMap, HashSet};

use crate::{Backend, BackendError, DEFAULT_PRIMARY_KEY, DropSummary};

/// A call received by a [`MemoryBackend`], recorded before it is answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListDatabases,
    CreateDatabase(String),
    SelectDatabase(String),
    ListTables,
    CreateTable {
        name: String,
        primary_key: Option<String>,
    },
    ListIndexes(String),
    CreateIndex {
        table: String,
        index: String,
    },
    DropDatabase(String),
}

/// A call a [`MemoryBackend`] should reject.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Failure {
    ListDatabases,
    ListTables,
    ListIndexes(String),
    CreateDatabase(String),
    CreateTable(String),
    CreateIndex { table: String, index: String },
    DropDatabase(String),
}

/// A table held by a [`MemoryBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryTable {
    pub primary_key: String,
    /// Secondary indexes, in creation order.
    pub indexes: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    databases: BTreeMap<String, BTreeMap<String, MemoryTable>>,
    selected: Option<String>,
    calls: Vec<Call>,
    failures: HashSet<Failure>,
    reported_databases_created: Option<u64>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing database.
    pub fn with_database(mut self, database: &str) -> Self {
        self.databases.entry(database.to_string()).or_default();
        self
    }

    /// Seed an existing table, creating its database if needed.
    pub fn with_table(mut self, database: &str, table: &str, primary_key: Option<&str>) -> Self {
        self.databases
            .entry(database.to_string())
            .or_default()
            .insert(
                table.to_string(),
                MemoryTable {
                    primary_key: primary_key.unwrap_or(DEFAULT_PRIMARY_KEY).to_string(),
                    indexes: Vec::new(),
                },
            );
        self
    }

    /// Seed an existing index on a table, creating the table if needed.
    pub fn with_index(mut self, database: &str, table: &str, index: &str) -> Self {
        self.databases
            .entry(database.to_string())
            .or_default()
            .entry(table.to_string())
            .or_insert_with(|| MemoryTable {
                primary_key: DEFAULT_PRIMARY_KEY.to_string(),
                indexes: Vec::new(),
            })
            .indexes
            .push(index.to_string());
        self
    }

    /// Reject every call matching `failure`.
    pub fn failing(mut self, failure: Failure) -> Self {
        self.failures.insert(failure);
        self
    }

    /// Report `count` from database creation instead of 1.
    ///
    /// The database is still created.
    pub fn reporting_databases_created(mut self, count: u64) -> Self {
        self.reported_databases_created = Some(count);
        self
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn has_database(&self, database: &str) -> bool {
        self.databases.contains_key(database)
    }

    pub fn table(&self, database: &str, table: &str) -> Option<&MemoryTable> {
        self.databases.get(database)?.get(table)
    }

    /// Table names of `database`, sorted.
    pub fn tables(&self, database: &str) -> Vec<&str> {
        self.databases
            .get(database)
            .map(|tables| tables.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Full contents, for comparing end states.
    pub fn state(&self) -> &BTreeMap<String, BTreeMap<String, MemoryTable>> {
        &self.databases
    }

    fn check(&self, failure: Failure) -> Result<(), BackendError> {
        if self.failures.contains(&failure) {
            Err(BackendError::Rejected(format!("injected failure: {:?}", failure)))
        } else {
            Ok(())
        }
    }

    fn selected_tables(&mut self) -> Result<&mut BTreeMap<String, MemoryTable>, BackendError> {
        let Some(selected) = &self.selected else {
            return Err(BackendError::Rejected("no database selected".to_string()));
        };
        self.databases
            .get_mut(selected)
            .ok_or_else(|| BackendError::Rejected(format!("database `{}` does not exist", selected)))
    }
}

impl Backend for MemoryBackend {
    async fn list_databases(&mut self) -> Result<Vec<String>, BackendError> {
        self.calls.push(Call::ListDatabases);
        self.check(Failure::ListDatabases)?;
        Ok(self.databases.keys().cloned().collect())
    }

    async fn create_database(&mut self, name: &str) -> Result<u64, BackendError> {
        self.calls.push(Call::CreateDatabase(name.to_string()));
        self.check(Failure::CreateDatabase(name.to_string()))?;
        if self.databases.contains_key(name) {
            return Err(BackendError::Rejected(format!(
                "database `{}` already exists",
                name
            )));
        }
        self.databases.insert(name.to_string(), BTreeMap::new());
        Ok(self.reported_databases_created.unwrap_or(1))
    }

    async fn select_database(&mut self, name: &str) -> Result<(), BackendError> {
        self.calls.push(Call::SelectDatabase(name.to_string()));
        if !self.databases.contains_key(name) {
            return Err(BackendError::Rejected(format!(
                "database `{}` does not exist",
                name
            )));
        }
        self.selected = Some(name.to_string());
        Ok(())
    }

    async fn list_tables(&mut self) -> Result<Vec<String>, BackendError> {
        self.calls.push(Call::ListTables);
        self.check(Failure::ListTables)?;
        Ok(self.selected_tables()?.keys().cloned().collect())
    }

    async fn create_table(
        &mut self,
        name: &str,
        primary_key: Option<&str>,
    ) -> Result<u64, BackendError> {
        self.calls.push(Call::CreateTable {
            name: name.to_string(),
            primary_key: primary_key.map(str::to_string),
        });
        self.check(Failure::CreateTable(name.to_string()))?;
        let tables = self.selected_tables()?;
        if tables.contains_key(name) {
            return Err(BackendError::Rejected(format!(
                "table `{}` already exists",
                name
            )));
        }
        tables.insert(
            name.to_string(),
            MemoryTable {
                primary_key: primary_key.unwrap_or(DEFAULT_PRIMARY_KEY).to_string(),
                indexes: Vec::new(),
            },
        );
        Ok(1)
    }

    async fn list_indexes(&mut self, table: &str) -> Result<Vec<String>, BackendError> {
        self.calls.push(Call::ListIndexes(table.to_string()));
        self.check(Failure::ListIndexes(table.to_string()))?;
        let tables = self.selected_tables()?;
        let table = tables
            .get(table)
            .ok_or_else(|| BackendError::Rejected(format!("table `{}` does not exist", table)))?;
        Ok(table.indexes.clone())
    }

    async fn create_index(&mut self, table: &str, index: &str) -> Result<(), BackendError> {
        self.calls.push(Call::CreateIndex {
            table: table.to_string(),
            index: index.to_string(),
        });
        self.check(Failure::CreateIndex {
            table: table.to_string(),
            index: index.to_string(),
        })?;
        let tables = self.selected_tables()?;
        let entry = tables
            .get_mut(table)
            .ok_or_else(|| BackendError::Rejected(format!("table `{}` does not exist", table)))?;
        if entry.indexes.iter().any(|i| i == index) {
            return Err(BackendError::Rejected(format!(
                "index `{}` already exists on table `{}`",
                index, table
            )));
        }
        entry.indexes.push(index.to_string());
        Ok(())
    }

    async fn drop_database(&mut self, name: &str) -> Result<DropSummary, BackendError> {
        self.calls.push(Call::DropDatabase(name.to_string()));
        self.check(Failure::DropDatabase(name.to_string()))?;
        let tables = self.databases.remove(name).ok_or_else(|| {
            BackendError::Rejected(format!("database `{}` does not exist", name))
        })?;
        if self.selected.as_deref() == Some(name) {
            self.selected = None;
        }
        Ok(DropSummary {
            databases_dropped: 1,
            tables_dropped: tables.len() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_table_applies_default_primary_key() {
        let mut backend = MemoryBackend::new().with_database("machines");
        backend.select_database("machines").await.unwrap();

        assert_eq!(backend.create_table("parts", None).await.unwrap(), 1);
        assert_eq!(
            backend.table("machines", "parts").unwrap().primary_key,
            "id"
        );
    }

    #[tokio::test]
    async fn test_table_calls_need_a_selected_database() {
        let mut backend = MemoryBackend::new().with_database("machines");
        assert!(backend.list_tables().await.is_err());
    }

    #[tokio::test]
    async fn test_injected_failure_is_recorded() {
        let mut backend = MemoryBackend::new().failing(Failure::CreateDatabase("machines".into()));

        assert!(backend.create_database("machines").await.is_err());
        assert!(!backend.has_database("machines"));
        assert_eq!(
            backend.calls(),
            &[Call::CreateDatabase("machines".to_string())]
        );
    }

    #[tokio::test]
    async fn test_drop_reports_table_count() {
        let mut backend = MemoryBackend::new()
            .with_table("machines", "robots", None)
            .with_table("machines", "parts", None);

        let summary = backend.drop_database("machines").await.unwrap();
        assert_eq!(
            summary,
            DropSummary {
                databases_dropped: 1,
                tables_dropped: 2,
            }
        );
        assert!(!backend.has_database("machines"));
    }
}
