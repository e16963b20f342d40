//! Create-if-missing reconciliation of databases, tables and secondary indexes.
//!
//! Given a [`DesiredState`] (one database, its tables, their primary keys and
//! secondary indexes), the [`Reconciler`] walks database -> tables -> indexes
//! against a live [`Backend`], creating only what is missing and reporting
//! what it created and what it left alone.
//!
//! Nothing is ever altered or removed, except through the explicit,
//! confirmed whole-database drop in [`drop_gate`].
//!
//! # Example
//!
//! ```ignore
//! use remigrate::{DesiredState, PgBackend, Reconciler, TableSpec};
//!
//! let desired = DesiredState::new("machines")
//!     .with_table(TableSpec::new("robots").primary_key("serial_num").index("model"))
//!     .with_table(TableSpec::new("parts"));
//!
//! let mut backend = PgBackend::connect(config).await?;
//! let outcome = Reconciler::new(&mut backend).run(&desired).await?;
//! println!("{}", outcome.counters);
//! ```
//!
//! # Idempotence
//!
//! Every existence check is re-derived from live state, so running the same
//! desired state twice creates nothing the second time. Re-running after a
//! failure resumes wherever the previous run stopped.

mod backend;
mod desired;
pub mod drop_gate;
mod engine;
mod error;
mod inspect;
pub mod memory;
mod postgres;
mod report;
pub mod sql;

pub use backend::Backend;
pub use desired::{DesiredState, TableSpec, is_valid_name};
pub use drop_gate::{AbortReason, DropGate, DropOutcome, DropState, Prompt, drop_database};
pub use engine::Reconciler;
pub use error::{BackendError, Error};
pub use inspect::LiveStateInspector;
pub use memory::MemoryBackend;
pub use postgres::{DEFAULT_ADMIN_DATABASE, PgBackend};
pub use report::{
    ACTION_WIDTH, Action, DropSummary, NAME_WIDTH, ObjectKind, ObjectRef, Observer, Reconciliation,
    RunCounters, StatusLine,
};

/// Primary key field a backend uses when a table declares none.
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// Result type for remigrate operations.
pub type Result<T> = std::result::Result<T, Error>;
