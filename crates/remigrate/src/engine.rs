//! The reconciliation engine.
//!
//! Walks database -> tables -> indexes, strictly in declared order, one call
//! at a time. Each level runs the same step: learn whether the object is
//! present, create it if it isn't, count what the backend reports, emit one
//! status line. The first error aborts everything that follows.

use std::future::Future;

use tracing::Instrument;

use crate::{
    Action, Backend, BackendError, DesiredState, Error, LiveStateInspector, ObjectRef, Observer,
    Reconciliation, Result, RunCounters, StatusLine, TableSpec,
};

/// One object the engine can bring into existence.
trait Target {
    fn object(&self) -> ObjectRef;

    /// Create the object, returning how many objects the backend created.
    fn create<B: Backend>(
        &self,
        backend: &mut B,
    ) -> impl Future<Output = std::result::Result<u64, BackendError>>;
}

struct DatabaseTarget<'a>(&'a str);

impl Target for DatabaseTarget<'_> {
    fn object(&self) -> ObjectRef {
        ObjectRef::Database(self.0.to_string())
    }

    async fn create<B: Backend>(&self, backend: &mut B) -> std::result::Result<u64, BackendError> {
        backend.create_database(self.0).await
    }
}

struct TableTarget<'a>(&'a TableSpec);

impl Target for TableTarget<'_> {
    fn object(&self) -> ObjectRef {
        ObjectRef::Table(self.0.name.clone())
    }

    async fn create<B: Backend>(&self, backend: &mut B) -> std::result::Result<u64, BackendError> {
        // no declared key: leave the option out and let the backend default it
        backend
            .create_table(&self.0.name, self.0.declared_primary_key())
            .await
    }
}

struct IndexTarget<'a> {
    table: &'a str,
    index: &'a str,
}

impl Target for IndexTarget<'_> {
    fn object(&self) -> ObjectRef {
        ObjectRef::Index {
            table: self.table.to_string(),
            name: self.index.to_string(),
        }
    }

    async fn create<B: Backend>(&self, backend: &mut B) -> std::result::Result<u64, BackendError> {
        backend.create_index(self.table, self.index).await?;
        Ok(1)
    }
}

/// Brings a backend's live state up to a [`DesiredState`], creating only
/// what is missing.
///
/// # Example
///
/// ```ignore
/// let mut lines = Vec::new();
/// let outcome = Reconciler::new(&mut backend)
///     .with_observer(&mut lines)
///     .run(&desired)
///     .await?;
/// ```
pub struct Reconciler<'b, B, O = ()> {
    backend: &'b mut B,
    observer: O,
    lines: Vec<StatusLine>,
    counters: RunCounters,
}

impl<'b, B: Backend> Reconciler<'b, B> {
    pub fn new(backend: &'b mut B) -> Self {
        Self {
            backend,
            observer: (),
            lines: Vec::new(),
            counters: RunCounters::default(),
        }
    }
}

impl<'b, B: Backend, O: Observer> Reconciler<'b, B, O> {
    /// Deliver every status line to `observer` as soon as it is produced.
    pub fn with_observer<P: Observer>(self, observer: P) -> Reconciler<'b, B, P> {
        Reconciler {
            backend: self.backend,
            observer,
            lines: self.lines,
            counters: self.counters,
        }
    }

    /// Reconcile the whole desired state and return what happened.
    ///
    /// Tables are never touched unless the database check (and creation, if
    /// needed) succeeded. On error no [`Reconciliation`] is produced; lines
    /// already delivered to the observer stay delivered.
    pub async fn run(self, desired: &DesiredState) -> Result<Reconciliation> {
        let span = tracing::info_span!("reconcile", database = %desired.database);
        self.run_inner(desired).instrument(span).await
    }

    async fn run_inner(mut self, desired: &DesiredState) -> Result<Reconciliation> {
        self.ensure_database(&desired.database).await?;
        self.backend
            .select_database(&desired.database)
            .await
            .map_err(|e| {
                Error::connectivity(format!("use database [{}]", desired.database), e)
            })?;

        for table in &desired.tables {
            self.ensure_table(table).await?;
            self.ensure_indexes(table).await?;
        }

        Ok(self.finish())
    }

    /// Create the database if it isn't there.
    pub async fn ensure_database(&mut self, name: &str) -> Result<Action> {
        let present = self.backend.database_exists(name).await?;
        self.ensure(&DatabaseTarget(name), present).await
    }

    /// Create a table if the selected database doesn't have it.
    ///
    /// An existing table is left as it is, whatever its primary key.
    pub async fn ensure_table(&mut self, table: &TableSpec) -> Result<Action> {
        let present = self.backend.table_exists(&table.name).await?;
        self.ensure(&TableTarget(table), present).await
    }

    /// Create the declared secondary indexes a table is missing.
    ///
    /// Indexes are listed once per table, not once per index. A table that
    /// declares no index costs no query at all.
    pub async fn ensure_indexes(&mut self, table: &TableSpec) -> Result<()> {
        if table.secondary_indexes.is_empty() {
            return Ok(());
        }

        let mut existing = self.backend.index_set(&table.name).await?;
        for index in &table.secondary_indexes {
            let target = IndexTarget {
                table: &table.name,
                index,
            };
            let action = self.ensure(&target, existing.contains(index.as_str())).await?;
            // a later duplicate of this name then reads as already present
            if action == Action::Create {
                existing.insert(index.clone());
            }
        }
        Ok(())
    }

    /// Counters and lines accumulated so far.
    pub fn finish(self) -> Reconciliation {
        Reconciliation {
            lines: self.lines,
            counters: self.counters,
        }
    }

    async fn ensure<T: Target>(&mut self, target: &T, present: bool) -> Result<Action> {
        let object = target.object();

        let action = if present {
            tracing::debug!(object = %object, "already present");
            Action::Ignore
        } else {
            let created = target
                .create(&mut *self.backend)
                .await
                .map_err(|source| Error::Creation {
                    object: object.clone(),
                    source,
                })?;
            if created != 1 {
                tracing::warn!(object = %object, created, "unusual creation count");
            }
            tracing::info!(object = %object, "created");
            self.counters.record(object.kind(), created);
            Action::Create
        };

        let line = StatusLine::new(object, action);
        self.observer.status(&line);
        self.lines.push(line);
        Ok(action)
    }
}
