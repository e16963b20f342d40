use thiserror::Error;

use crate::report::ObjectRef;

/// An error reported by a [`Backend`](crate::Backend) call.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("postgres request failed")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("{0}")]
    Rejected(String),
}

/// Everything that can abort a run.
///
/// None of these are retried. Re-running the whole process is the
/// remediation, since every check is re-derived from live state.
#[derive(Debug, Error)]
pub enum Error {
    #[error("could not {operation}")]
    Connectivity {
        operation: String,
        #[source]
        source: BackendError,
    },

    #[error("failed to create {object}")]
    Creation {
        object: ObjectRef,
        #[source]
        source: BackendError,
    },

    #[error("database [{0}] does not exist, cannot drop non-existent database")]
    Precondition(String),

    #[error("refusing to drop [{0}] database without confirmation")]
    Unconfirmed(String),

    #[error("failed to drop [{database}] database")]
    Drop {
        database: String,
        #[source]
        source: BackendError,
    },

    #[error("could not read confirmation")]
    Prompt(#[source] std::io::Error),

    #[error("invalid {kind} name {name:?}: only ASCII letters, digits and underscores are allowed")]
    InvalidName { kind: &'static str, name: String },

    #[error(
        "{kind} name {name:?} is too long: its identifier would be {len} bytes, the limit is {}",
        crate::sql::MAX_IDENTIFIER_LEN
    )]
    NameTooLong {
        kind: &'static str,
        name: String,
        len: usize,
    },
}

impl Error {
    pub(crate) fn connectivity(operation: impl Into<String>, source: BackendError) -> Self {
        Error::Connectivity {
            operation: operation.into(),
            source,
        }
    }
}
