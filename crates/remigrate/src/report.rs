//! Status lines, counters and summaries produced by a run.
//!
//! The engine only builds these values. Rendering them (and deciding where
//! they go) is the caller's business, via [`Observer`] and the `Display`
//! impls below.

use std::fmt;

/// Width of the name column in status lines.
pub const NAME_WIDTH: usize = 30;

/// Width of the action column in status lines.
pub const ACTION_WIDTH: usize = 10;

/// A schema object the engine reconciles.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjectRef {
    Database(String),
    Table(String),
    Index { table: String, name: String },
}

impl ObjectRef {
    pub fn kind(&self) -> ObjectKind {
        match self {
            ObjectRef::Database(_) => ObjectKind::Database,
            ObjectRef::Table(_) => ObjectKind::Table,
            ObjectRef::Index { .. } => ObjectKind::Index,
        }
    }

    /// The object's own name (not its parent's).
    pub fn name(&self) -> &str {
        match self {
            ObjectRef::Database(name) | ObjectRef::Table(name) => name,
            ObjectRef::Index { name, .. } => name,
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectRef::Database(name) => write!(f, "[{}] database", name),
            ObjectRef::Table(name) => write!(f, "[{}] table", name),
            ObjectRef::Index { table, name } => {
                write!(f, "[{}] secondary index on table [{}]", name, table)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Database,
    Table,
    Index,
}

/// What the engine did with one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// The object was missing and has been created.
    Create,
    /// The object already existed and was left alone.
    Ignore,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Ignore => "ignore",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // pad() so callers can apply width specifiers
        f.pad(self.as_str())
    }
}

/// One line of output per reconciled object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub object: ObjectRef,
    pub action: Action,
}

impl StatusLine {
    pub fn new(object: ObjectRef, action: Action) -> Self {
        Self { object, action }
    }

    /// Name column, padded to its fixed width.
    pub fn name_column(&self) -> String {
        format!("[{:<width$}]", self.object.name(), width = NAME_WIDTH)
    }

    /// Trailing description: object kind, existence note, parent table.
    pub fn description(&self) -> String {
        let exists = self.action == Action::Ignore;
        match (&self.object, exists) {
            (ObjectRef::Database(_), false) => "database".to_string(),
            (ObjectRef::Database(_), true) => "database exists".to_string(),
            (ObjectRef::Table(_), false) => "table".to_string(),
            (ObjectRef::Table(_), true) => "table exists".to_string(),
            (ObjectRef::Index { table, .. }, false) => format!("secondary index on {}", table),
            (ObjectRef::Index { table, .. }, true) => {
                format!("secondary index exists on {}", table)
            }
        }
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:<width$} {}",
            self.name_column(),
            self.action,
            self.description(),
            width = ACTION_WIDTH
        )
    }
}

/// Cumulative creation counts for one run.
///
/// Only successful create calls add to these, and they add whatever the
/// backend reported (which may be 0).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub databases_created: u64,
    pub tables_created: u64,
    pub indexes_created: u64,
}

impl RunCounters {
    pub(crate) fn record(&mut self, kind: ObjectKind, created: u64) {
        let counter = match kind {
            ObjectKind::Database => &mut self.databases_created,
            ObjectKind::Table => &mut self.tables_created,
            ObjectKind::Index => &mut self.indexes_created,
        };
        *counter += created;
    }

    /// True when the run changed nothing.
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

impl fmt::Display for RunCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "---")?;
        writeln!(f, "{:<3} database created", self.databases_created)?;
        writeln!(f, "{:<3} table(s) created", self.tables_created)?;
        write!(f, "{:<3} secondary index(es) created", self.indexes_created)
    }
}

/// Result of a successful reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Every status line, in the order the objects were visited.
    pub lines: Vec<StatusLine>,
    pub counters: RunCounters,
}

impl Reconciliation {
    /// Objects created during the run, in order.
    pub fn created(&self) -> impl Iterator<Item = &ObjectRef> {
        self.lines
            .iter()
            .filter(|l| l.action == Action::Create)
            .map(|l| &l.object)
    }
}

/// What the backend reported after dropping a database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropSummary {
    pub databases_dropped: u64,
    pub tables_dropped: u64,
}

impl fmt::Display for DropSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<3} database dropped", self.databases_dropped)?;
        write!(f, "{:<3} table(s) dropped", self.tables_dropped)
    }
}

/// Receives status lines as soon as the engine produces them.
///
/// Lines emitted before a fatal error are still delivered, which is why
/// this is a callback and not only part of the returned [`Reconciliation`].
pub trait Observer {
    fn status(&mut self, line: &StatusLine);
}

impl Observer for () {
    fn status(&mut self, _line: &StatusLine) {}
}

impl Observer for Vec<StatusLine> {
    fn status(&mut self, line: &StatusLine) {
        self.push(line.clone());
    }
}

impl<O: Observer + ?Sized> Observer for &mut O {
    fn status(&mut self, line: &StatusLine) {
        (**self).status(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(table: &str, name: &str) -> ObjectRef {
        ObjectRef::Index {
            table: table.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn snapshot_create_database_line() {
        let line = StatusLine::new(ObjectRef::Database("machines".into()), Action::Create);
        insta::assert_snapshot!(line.to_string(), @"[machines                      ] create     database");
    }

    #[test]
    fn snapshot_ignore_table_line() {
        let line = StatusLine::new(ObjectRef::Table("robots".into()), Action::Ignore);
        insta::assert_snapshot!(line.to_string(), @"[robots                        ] ignore     table exists");
    }

    #[test]
    fn snapshot_index_lines() {
        let created = StatusLine::new(index("robots", "version"), Action::Create);
        insta::assert_snapshot!(created.to_string(), @"[version                       ] create     secondary index on robots");

        let ignored = StatusLine::new(index("robots", "model"), Action::Ignore);
        insta::assert_snapshot!(ignored.to_string(), @"[model                         ] ignore     secondary index exists on robots");
    }

    #[test]
    fn test_long_names_are_not_truncated() {
        let name = "a".repeat(40);
        let line = StatusLine::new(ObjectRef::Table(name.clone()), Action::Create);
        assert!(line.to_string().starts_with(&format!("[{}]", name)));
    }

    #[test]
    fn test_summary_format() {
        let counters = RunCounters {
            databases_created: 1,
            tables_created: 2,
            indexes_created: 2,
        };
        assert_eq!(
            counters.to_string(),
            "---\n1   database created\n2   table(s) created\n2   secondary index(es) created"
        );
    }

    #[test]
    fn test_drop_summary_format() {
        let summary = DropSummary {
            databases_dropped: 1,
            tables_dropped: 12,
        };
        assert_eq!(
            summary.to_string(),
            "1   database dropped\n12  table(s) dropped"
        );
    }

    #[test]
    fn test_object_ref_display_names_parent() {
        assert_eq!(
            index("robots", "model").to_string(),
            "[model] secondary index on table [robots]"
        );
        assert_eq!(
            ObjectRef::Database("machines".into()).to_string(),
            "[machines] database"
        );
    }

    #[test]
    fn test_counters_record_by_kind() {
        let mut counters = RunCounters::default();
        assert!(counters.is_zero());
        counters.record(ObjectKind::Database, 1);
        counters.record(ObjectKind::Table, 0);
        counters.record(ObjectKind::Index, 1);
        counters.record(ObjectKind::Index, 1);
        assert_eq!(
            counters,
            RunCounters {
                databases_created: 1,
                tables_created: 0,
                indexes_created: 2,
            }
        );
    }
}
