//! PostgreSQL [`Backend`].
//!
//! Holds exactly one connection at a time. The connection starts on an
//! administrative database; selecting another database replaces it with a
//! connection bound to that database. Every statement runs inside a
//! `tracing` debug span carrying its SQL.

use tokio::task::JoinHandle;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, Config, NoTls, Row};
use tracing::Instrument;

use crate::sql::{self, Ident};
use crate::{Backend, BackendError, DEFAULT_PRIMARY_KEY, DropSummary, Error, Result};

/// Database used when the connection config names none.
pub const DEFAULT_ADMIN_DATABASE: &str = "postgres";

pub struct PgBackend {
    config: Config,
    admin_database: String,
    current_database: String,
    client: Client,
    connection: JoinHandle<()>,
}

impl PgBackend {
    /// Connect to the database named in `config`, or
    /// [`DEFAULT_ADMIN_DATABASE`] when it names none.
    ///
    /// That database stays the administrative database: it is where
    /// databases are listed, created and dropped from.
    pub async fn connect(config: Config) -> Result<Self> {
        let admin_database = config
            .get_dbname()
            .unwrap_or(DEFAULT_ADMIN_DATABASE)
            .to_string();
        let (client, connection) = open(&config, &admin_database).await.map_err(|e| {
            Error::connectivity(
                format!("connect to postgres database [{}]", admin_database),
                e,
            )
        })?;

        Ok(Self {
            config,
            current_database: admin_database.clone(),
            admin_database,
            client,
            connection,
        })
    }

    /// The database the connection is currently bound to.
    pub fn current_database(&self) -> &str {
        &self.current_database
    }

    /// The database connections return to between operations.
    pub fn admin_database(&self) -> &str {
        &self.admin_database
    }

    /// Close the connection and wait for its driver task to finish.
    pub async fn close(self) {
        drop(self.client);
        if let Err(e) = self.connection.await {
            tracing::warn!(error = %e, "postgres connection task did not shut down cleanly");
        }
    }

    /// Replace the connection with one bound to `database`.
    async fn rebind(&mut self, database: &str) -> std::result::Result<(), BackendError> {
        if self.current_database == database {
            return Ok(());
        }
        let (client, connection) = open(&self.config, database).await?;
        // dropping the old client lets its driver task run to completion
        self.client = client;
        self.connection = connection;
        self.current_database = database.to_string();
        tracing::debug!(database, "switched connection");
        Ok(())
    }

    async fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> std::result::Result<Vec<Row>, tokio_postgres::Error> {
        let span = tracing::debug_span!(
            "db.query",
            sql = %sql,
            params = params.len(),
            rows = tracing::field::Empty,
        );
        let rows = self
            .client
            .query(sql, params)
            .instrument(span.clone())
            .await?;
        span.record("rows", rows.len());
        Ok(rows)
    }

    /// Run a statement without parameters (DDL goes through here).
    async fn execute(&self, sql: &str) -> std::result::Result<(), tokio_postgres::Error> {
        let span = tracing::debug_span!("db.execute", sql = %sql);
        self.client.batch_execute(sql).instrument(span).await
    }

    async fn names(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> std::result::Result<Vec<String>, BackendError> {
        let rows = self.query(sql, params).await?;
        rows.iter()
            .map(|row| row.try_get::<_, String>(0).map_err(BackendError::from))
            .collect()
    }
}

async fn open(
    config: &Config,
    database: &str,
) -> std::result::Result<(Client, JoinHandle<()>), BackendError> {
    let mut config = config.clone();
    config.dbname(database);
    let (client, connection) = config.connect(NoTls).await?;
    let handle = tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!(error = %e, "postgres connection error");
        }
    });
    Ok((client, handle))
}

impl Backend for PgBackend {
    async fn list_databases(&mut self) -> std::result::Result<Vec<String>, BackendError> {
        self.names(sql::LIST_DATABASES_SQL, &[]).await
    }

    async fn create_database(&mut self, name: &str) -> std::result::Result<u64, BackendError> {
        self.execute(&sql::create_database_sql(name)).await?;
        Ok(1)
    }

    async fn select_database(&mut self, name: &str) -> std::result::Result<(), BackendError> {
        self.rebind(name).await
    }

    async fn list_tables(&mut self) -> std::result::Result<Vec<String>, BackendError> {
        self.names(sql::LIST_TABLES_SQL, &[]).await
    }

    async fn create_table(
        &mut self,
        name: &str,
        primary_key: Option<&str>,
    ) -> std::result::Result<u64, BackendError> {
        let primary_key = primary_key.unwrap_or(DEFAULT_PRIMARY_KEY);
        self.execute(&sql::create_table_sql(name, primary_key)).await?;
        Ok(1)
    }

    async fn list_indexes(
        &mut self,
        table: &str,
    ) -> std::result::Result<Vec<String>, BackendError> {
        let physical = self.names(sql::LIST_INDEXES_SQL, &[&table]).await?;
        Ok(physical
            .iter()
            .map(|name| sql::logical_index_name(table, name))
            .collect())
    }

    async fn create_index(
        &mut self,
        table: &str,
        index: &str,
    ) -> std::result::Result<(), BackendError> {
        self.execute(&sql::create_index_sql(table, index)).await?;
        Ok(())
    }

    async fn drop_database(
        &mut self,
        name: &str,
    ) -> std::result::Result<DropSummary, BackendError> {
        // postgres refuses to drop the database a session is connected to
        if name == self.admin_database {
            return Err(BackendError::Rejected(format!(
                "cannot drop [{}]: it is the administrative database",
                name
            )));
        }

        // tables have to be counted from inside the doomed database
        self.rebind(name).await?;
        let row = self
            .query(sql::COUNT_TABLES_SQL, &[])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::Rejected("table count returned no rows".to_string()))?;
        let tables: i64 = row.try_get(0)?;

        let admin = self.admin_database.clone();
        self.rebind(&admin).await?;
        self.execute(&sql::drop_database_sql(name)).await?;
        tracing::info!(database = %Ident(name), tables, "dropped database");

        Ok(DropSummary {
            databases_dropped: 1,
            tables_dropped: tables.max(0) as u64,
        })
    }
}
