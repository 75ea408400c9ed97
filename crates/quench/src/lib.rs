//! Schema reconciliation and changelog tracking for SQL databases.
//!
//! quench compares tables declared in code against the live database
//! schema and emits the DDL needed to reconcile them, and keeps an
//! ordered, conflict-checked ledger of applied migration statements.
//!
//! # Reconciliation
//!
//! ```no_run
//! use quench::definition::{ColumnDef, ColumnType, TableDef};
//! use quench::dialect::SqliteDialect;
//! use quench::reconcile::Reconciler;
//!
//! # async fn demo(pool: sqlx::SqlitePool) -> quench::error::Result<()> {
//! let users = TableDef::new("users")
//!     .column(ColumnDef::new("id", ColumnType::Integer).auto_increment())
//!     .column(ColumnDef::new("email", ColumnType::varchar(100)));
//!
//! let reconciler = Reconciler::new(pool, SqliteDialect::new());
//! reconciler.apply(&[users]).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Changelog
//!
//! ```no_run
//! use quench::changelog::{ChangeLog, Changeset};
//!
//! # async fn demo(pool: sqlx::SqlitePool) -> quench::error::Result<()> {
//! let changeset = Changeset::builder("init")
//!     .statement("CREATE TABLE settings (key TEXT NOT NULL, value TEXT)")
//!     .build();
//!
//! let ledger = ChangeLog::new(pool);
//! ledger.apply(&changeset).await?;
//! # Ok(())
//! # }
//! ```

pub mod changelog;
pub mod definition;
pub mod dialect;
pub mod error;
pub mod reconcile;
pub mod snapshot;
pub mod statement;

pub use changelog::{ChangeLog, ChangeLogEntry, Changeset, ChangesetBuilder};
pub use definition::{
    ColumnDef, ColumnType, DefaultValue, ForeignKeyDef, IndexDef, PrimaryKeyDef, TableDef,
    TypeCategory,
};
pub use dialect::{PostgresDialect, SchemaDialect, SqliteDialect, TypeCompat};
pub use error::{ReconcileError, Result};
pub use reconcile::{ReconcileOptions, Reconciler, ValidationItem};
pub use snapshot::{Snapshot, SnapshotColumn, SnapshotReader, SnapshotTable};
pub use statement::SqlBuilder;
