use std::future::Future;

use crate::{BackendError, DropSummary};

/// The database collaborator the engine reconciles against.
///
/// Implementations answer with what the backend itself reports: listings
/// come back in whatever order the backend likes, and create calls return
/// the number of objects the backend says it created.
///
/// Table-level and index-level calls are scoped to the database chosen with
/// [`select_database`](Backend::select_database).
pub trait Backend {
    /// Names of every database visible to the connection.
    fn list_databases(&mut self) -> impl Future<Output = Result<Vec<String>, BackendError>>;

    /// Create a database, returning how many databases were created.
    fn create_database(&mut self, name: &str)
    -> impl Future<Output = Result<u64, BackendError>>;

    /// Scope all following table and index calls to `name`.
    fn select_database(&mut self, name: &str) -> impl Future<Output = Result<(), BackendError>>;

    /// Names of every table in the selected database.
    fn list_tables(&mut self) -> impl Future<Output = Result<Vec<String>, BackendError>>;

    /// Create a table, returning how many tables were created.
    ///
    /// When `primary_key` is `None` the backend applies its default,
    /// [`DEFAULT_PRIMARY_KEY`](crate::DEFAULT_PRIMARY_KEY).
    fn create_table(
        &mut self,
        name: &str,
        primary_key: Option<&str>,
    ) -> impl Future<Output = Result<u64, BackendError>>;

    /// Secondary index names currently defined on `table`.
    fn list_indexes(
        &mut self,
        table: &str,
    ) -> impl Future<Output = Result<Vec<String>, BackendError>>;

    /// Create a secondary index named `index` on `table`.
    fn create_index(
        &mut self,
        table: &str,
        index: &str,
    ) -> impl Future<Output = Result<(), BackendError>>;

    /// Irreversibly drop a database and everything in it.
    fn drop_database(
        &mut self,
        name: &str,
    ) -> impl Future<Output = Result<DropSummary, BackendError>>;
}
