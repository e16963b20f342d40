//! Existence checks against live state.

use std::collections::HashSet;
use std::future::Future;

use crate::{Backend, Error, Result};

/// Existence facts, queried fresh on every call.
///
/// Implemented for every [`Backend`]. A failing listing call is a
/// [`Error::Connectivity`]: nothing downstream can be trusted without it.
pub trait LiveStateInspector {
    /// Whether a database named `name` is visible to the connection.
    fn database_exists(&mut self, name: &str) -> impl Future<Output = Result<bool>>;

    /// Whether the selected database has a table named `name`.
    fn table_exists(&mut self, name: &str) -> impl Future<Output = Result<bool>>;

    /// Secondary indexes currently defined on `table`.
    fn index_set(&mut self, table: &str) -> impl Future<Output = Result<HashSet<String>>>;
}

impl<B: Backend> LiveStateInspector for B {
    async fn database_exists(&mut self, name: &str) -> Result<bool> {
        let databases = self
            .list_databases()
            .await
            .map_err(|e| Error::connectivity("list all database names in the system", e))?;
        Ok(databases.iter().any(|db| db == name))
    }

    async fn table_exists(&mut self, name: &str) -> Result<bool> {
        let tables = self
            .list_tables()
            .await
            .map_err(|e| Error::connectivity("list all table names in database", e))?;
        Ok(tables.iter().any(|t| t == name))
    }

    async fn index_set(&mut self, table: &str) -> Result<HashSet<String>> {
        let indexes = self.list_indexes(table).await.map_err(|e| {
            Error::connectivity(format!("list secondary indexes on table [{}]", table), e)
        })?;
        Ok(indexes.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Call, Failure, MemoryBackend};

    #[tokio::test]
    async fn test_database_exists_queries_every_time() {
        let mut backend = MemoryBackend::new().with_database("machines");

        assert!(backend.database_exists("machines").await.unwrap());
        assert!(!backend.database_exists("parts").await.unwrap());
        assert_eq!(
            backend.calls(),
            &[Call::ListDatabases, Call::ListDatabases]
        );
    }

    #[tokio::test]
    async fn test_listing_failure_is_connectivity_error() {
        let mut backend = MemoryBackend::new().failing(Failure::ListDatabases);

        let err = backend.database_exists("machines").await.unwrap_err();
        assert!(matches!(err, Error::Connectivity { .. }));
        assert_eq!(
            err.to_string(),
            "could not list all database names in the system"
        );
    }

    #[tokio::test]
    async fn test_table_exists_is_scoped_to_selected_database() {
        let mut backend = MemoryBackend::new()
            .with_table("machines", "robots", None)
            .with_database("other");

        backend.select_database("other").await.unwrap();
        assert!(!backend.table_exists("robots").await.unwrap());

        backend.select_database("machines").await.unwrap();
        assert!(backend.table_exists("robots").await.unwrap());
    }

    #[tokio::test]
    async fn test_index_set() {
        let mut backend = MemoryBackend::new()
            .with_table("machines", "robots", Some("serial_num"))
            .with_index("machines", "robots", "model")
            .with_index("machines", "robots", "version");
        backend.select_database("machines").await.unwrap();

        let set = backend.index_set("robots").await.unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("model"));
        assert!(set.contains("version"));
    }
}
