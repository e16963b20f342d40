//! SQL text for the PostgreSQL backend.
//!
//! Tables are document tables: a text primary key plus a `jsonb` body.
//! A secondary index is an expression index over one field of that body,
//! physically named `idx:{table}:{index}`.

use std::fmt::{self, Write};

/// Column holding each row's document.
pub const DOC_COLUMN: &str = "doc";

/// Longest identifier PostgreSQL keeps; longer ones are silently truncated.
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// Separates the parts of a physical index name. Valid names never contain
/// it, so no two (table, index) pairs share a physical name and no physical
/// index name can equal a table name.
const INDEX_NAME_SEPARATOR: char = ':';

/// Renders as a double-quoted identifier.
pub struct Ident<T: AsRef<str>>(pub T);

/// Renders as a single-quoted string literal.
pub struct Lit<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> fmt::Display for Ident<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        quoted(f, self.0.as_ref(), '"')
    }
}

impl<T: AsRef<str>> fmt::Display for Lit<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        quoted(f, self.0.as_ref(), '\'')
    }
}

/// Write `value` between `quote`s, doubling any embedded `quote`.
fn quoted(f: &mut fmt::Formatter<'_>, value: &str, quote: char) -> fmt::Result {
    f.write_char(quote)?;
    for c in value.chars() {
        if c == quote {
            f.write_char(quote)?;
        }
        f.write_char(c)?;
    }
    f.write_char(quote)
}

/// Physical name of the index backing secondary index `index` on `table`.
pub fn index_name(table: &str, index: &str) -> String {
    format!(
        "idx{sep}{}{sep}{}",
        table,
        index,
        sep = INDEX_NAME_SEPARATOR
    )
}

/// Map a physical index name back to the secondary index it backs.
///
/// Names that don't follow the [`index_name`] convention for `table` are
/// returned as-is.
pub fn logical_index_name(table: &str, physical: &str) -> String {
    physical
        .strip_prefix(&index_name(table, ""))
        .filter(|rest| !rest.is_empty() && !rest.contains(INDEX_NAME_SEPARATOR))
        .unwrap_or(physical)
        .to_string()
}

pub fn create_database_sql(name: &str) -> String {
    format!("CREATE DATABASE {}", Ident(name))
}

pub fn drop_database_sql(name: &str) -> String {
    format!("DROP DATABASE {}", Ident(name))
}

/// Generate CREATE TABLE SQL for a document table keyed by `primary_key`.
pub fn create_table_sql(name: &str, primary_key: &str) -> String {
    format!(
        "CREATE TABLE {} ({} text PRIMARY KEY, {} jsonb NOT NULL DEFAULT '{{}}'::jsonb)",
        Ident(name),
        Ident(primary_key),
        Ident(DOC_COLUMN)
    )
}

/// Generate CREATE INDEX SQL for secondary index `index` on `table`.
pub fn create_index_sql(table: &str, index: &str) -> String {
    format!(
        "CREATE INDEX {} ON {} (({} ->> {}))",
        Ident(index_name(table, index)),
        Ident(table),
        Ident(DOC_COLUMN),
        Lit(index)
    )
}

pub const LIST_DATABASES_SQL: &str =
    "SELECT datname::text FROM pg_catalog.pg_database WHERE NOT datistemplate";

pub const LIST_TABLES_SQL: &str =
    "SELECT tablename::text FROM pg_catalog.pg_tables WHERE schemaname = current_schema()";

pub const LIST_INDEXES_SQL: &str = "SELECT i.relname::text \
     FROM pg_catalog.pg_index x \
     JOIN pg_catalog.pg_class i ON i.oid = x.indexrelid \
     JOIN pg_catalog.pg_class t ON t.oid = x.indrelid \
     JOIN pg_catalog.pg_namespace n ON n.oid = t.relnamespace \
     WHERE t.relname = $1 \
       AND n.nspname = current_schema() \
       AND NOT x.indisprimary";

pub const COUNT_TABLES_SQL: &str = "SELECT count(*) FROM pg_catalog.pg_tables \
     WHERE schemaname NOT IN ('pg_catalog', 'information_schema')";
