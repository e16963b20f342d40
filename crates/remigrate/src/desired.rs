//! The declared target schema.
//!
//! A [`DesiredState`] is produced once per run (usually by the config loader)
//! and only read afterwards. Declared order is preserved everywhere so output
//! is reproducible.

use crate::sql::{self, MAX_IDENTIFIER_LEN};
use crate::{Error, Result};

/// What should exist after a run: one database and its tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredState {
    /// Name of the database every table lives in.
    pub database: String,

    /// Tables, in declared order.
    pub tables: Vec<TableSpec>,
}

/// A single declared table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    /// Table name.
    pub name: String,

    /// Primary key field. When `None` the backend picks its own default
    /// (`id` for every shipped backend).
    pub primary_key: Option<String>,

    /// Secondary index names, in declared order. Duplicates are kept as-is.
    pub secondary_indexes: Vec<String>,
}

impl DesiredState {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            tables: Vec::new(),
        }
    }

    /// Append a table, builder style.
    pub fn with_table(mut self, table: TableSpec) -> Self {
        self.tables.push(table);
        self
    }

    /// Check every name against [`is_valid_name`] and the identifier length
    /// limit.
    ///
    /// Runs before any connection is opened, so a bad name never reaches a
    /// backend statement. A name that would be truncated is rejected too:
    /// the truncated object would never match its declaration on the next run.
    pub fn validate(&self) -> Result<()> {
        check_name("database", &self.database, self.database.len())?;
        for table in &self.tables {
            check_name("table", &table.name, table.name.len())?;
            if let Some(pk) = table.declared_primary_key() {
                check_name("primary key", pk, pk.len())?;
            }
            for index in &table.secondary_indexes {
                let physical = sql::index_name(&table.name, index).len();
                check_name("secondary index", index, physical)?;
            }
        }
        Ok(())
    }
}

impl TableSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: None,
            secondary_indexes: Vec::new(),
        }
    }

    pub fn primary_key(mut self, pk: impl Into<String>) -> Self {
        self.primary_key = Some(pk.into());
        self
    }

    pub fn index(mut self, name: impl Into<String>) -> Self {
        self.secondary_indexes.push(name.into());
        self
    }

    /// The declared primary key, treating an empty string as "not declared".
    pub fn declared_primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref().filter(|pk| !pk.is_empty())
    }
}

/// Names must be non-empty and made of ASCII alphanumerics and underscores.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// `identifier_len` is the length of the identifier the backend will store
/// for `name`.
fn check_name(kind: &'static str, name: &str, identifier_len: usize) -> Result<()> {
    if !is_valid_name(name) {
        return Err(Error::InvalidName {
            kind,
            name: name.to_string(),
        });
    }
    if identifier_len > MAX_IDENTIFIER_LEN {
        return Err(Error::NameTooLong {
            kind,
            name: name.to_string(),
            len: identifier_len,
        });
    }
    Ok(())
}
