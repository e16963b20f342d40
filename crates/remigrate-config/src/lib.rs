//! The remigrate configuration file.
//!
//! A single `.styx` document names the PostgreSQL server to talk to and the
//! desired state to reconcile against it:
//!
//! ```styx
//! ip localhost
//! port 5432
//! user postgres
//! password secret
//! database_name machines
//! tables (
//!   {name robots, primary_key serial_num, simple_index (version model)}
//!   {name parts}
//! )
//! ```
//!
//! Everything but `database_name` is optional.

use std::path::{Path, PathBuf};

use facet::Facet;
use remigrate::{DEFAULT_ADMIN_DATABASE, DesiredState, TableSpec};
use thiserror::Error;

/// File read when no path is given on the command line.
pub const DEFAULT_CONFIG_FILE: &str = "remigrate.styx";

pub const DEFAULT_IP: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5432;
pub const DEFAULT_USER: &str = "postgres";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Facet)]
pub struct Config {
    /// Server host name or address.
    pub ip: Option<String>,

    pub port: Option<u16>,

    pub user: Option<String>,

    pub password: Option<String>,

    /// Database the initial connection is made to, and where databases are
    /// created and dropped from.
    pub admin_database: Option<String>,

    /// The database to reconcile.
    pub database_name: String,

    /// Tables, in the order they are reconciled.
    pub tables: Option<Vec<Table>>,
}

/// One declared table.
#[derive(Debug, Clone, PartialEq, Facet)]
pub struct Table {
    pub name: String,

    /// Primary key field; the backend default (`id`) when absent.
    pub primary_key: Option<String>,

    /// Secondary indexes on single document fields.
    pub simple_index: Option<Vec<String>>,
}

impl Config {
    pub fn ip(&self) -> &str {
        self.ip.as_deref().unwrap_or(DEFAULT_IP)
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn user(&self) -> &str {
        self.user.as_deref().unwrap_or(DEFAULT_USER)
    }

    pub fn admin_database(&self) -> &str {
        self.admin_database
            .as_deref()
            .unwrap_or(DEFAULT_ADMIN_DATABASE)
    }

    pub fn tables(&self) -> &[Table] {
        self.tables.as_deref().unwrap_or_default()
    }

    /// The desired state this configuration declares.
    pub fn desired_state(&self) -> DesiredState {
        DesiredState {
            database: self.database_name.clone(),
            tables: self.tables().iter().map(Table::to_table_spec).collect(),
        }
    }
}

impl Table {
    fn to_table_spec(&self) -> TableSpec {
        TableSpec {
            name: self.name.clone(),
            primary_key: self.primary_key.clone(),
            secondary_indexes: self.simple_index.clone().unwrap_or_default(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid configuration in {}", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: remigrate::Error,
    },
}

/// Read, parse and validate the configuration at `path`.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&content, path)
}

/// Parse and validate `source`; `path` is only used in error messages.
pub fn parse(source: &str, path: &Path) -> Result<Config, ConfigError> {
    let config: Config = facet_styx::from_str(source).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    config
        .desired_state()
        .validate()
        .map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MACHINES: &str = r#"
ip db.internal
port 5433
user admin
password hunter2
database_name machines
tables (
  {name robots, primary_key serial_num, simple_index (version model)}
  {name parts}
)
"#;

    fn parse_str(source: &str) -> Result<Config, ConfigError> {
        parse(source, Path::new("test.styx"))
    }

    #[test]
    fn test_full_config() {
        let config = parse_str(MACHINES).unwrap();
        assert_eq!(config.ip(), "db.internal");
        assert_eq!(config.port(), 5433);
        assert_eq!(config.user(), "admin");
        assert_eq!(config.password.as_deref(), Some("hunter2"));
        assert_eq!(config.admin_database(), "postgres");

        assert_eq!(
            config.desired_state(),
            DesiredState::new("machines")
                .with_table(
                    TableSpec::new("robots")
                        .primary_key("serial_num")
                        .index("version")
                        .index("model"),
                )
                .with_table(TableSpec::new("parts"))
        );
    }

    #[test]
    fn test_defaults() {
        let config = parse_str("database_name machines").unwrap();
        assert_eq!(config.ip(), DEFAULT_IP);
        assert_eq!(config.port(), DEFAULT_PORT);
        assert_eq!(config.user(), DEFAULT_USER);
        assert_eq!(config.password, None);
        assert!(config.tables().is_empty());
        assert_eq!(config.desired_state(), DesiredState::new("machines"));
    }

    #[test]
    fn test_missing_database_name_is_parse_error() {
        let err = parse_str("ip localhost").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "{:?}", err);
    }

    #[test]
    fn test_bad_names_are_rejected() {
        let err = parse_str("database_name machines\ntables ({name \"ro bots\"})").unwrap_err();
        match err {
            ConfigError::Invalid { source, .. } => assert!(matches!(
                source,
                remigrate::Error::InvalidName { kind: "table", .. }
            )),
            other => panic!("expected an invalid config, got {:?}", other),
        }
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("remigrate.styx");

        let err = load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().starts_with("failed to read "));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("remigrate.styx");
        std::fs::write(&path, MACHINES).unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config.database_name, "machines");
        assert_eq!(config.tables().len(), 2);
    }
}
