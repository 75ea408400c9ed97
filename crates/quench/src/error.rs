//! Error types for schema reconciliation and changelog tracking.

/// Errors that can occur while reconciling schemas or applying changesets.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// A changeset statement was given an invalid sequence number.
    #[error("Invalid sequence number {vid} in changeset '{changeset}': {reason}")]
    InvalidSequence {
        /// Changeset name.
        changeset: String,
        /// The offending sequence number.
        vid: i32,
        /// Why the number was rejected.
        reason: String,
    },

    /// A recorded changelog statement no longer matches the incoming one.
    ///
    /// History must not mutate: the same (sequence, changeset) identity
    /// presenting different SQL text is a consistency violation, never a
    /// silent update.
    #[error(
        "Changelog statement [{vid}] of '{changeset}' was changed: recorded `{recorded}`, incoming `{incoming}`"
    )]
    ChangesetConflict {
        /// Changeset name.
        changeset: String,
        /// Sequence number of the diverging statement.
        vid: i32,
        /// SQL text already on record.
        recorded: String,
        /// SQL text now being applied.
        incoming: String,
    },

    /// The engine reported a column type the dialect has no mapping for.
    #[error("Database type '{type_name}' is not known to the {dialect} dialect")]
    UnknownDbType {
        /// Dialect name.
        dialect: &'static str,
        /// Raw type name as reported by the engine.
        type_name: String,
    },

    /// A declared column cannot be rendered to SQL by the dialect.
    #[error("Unsupported column: {0}")]
    UnsupportedColumn(String),

    /// Database error while executing a statement or reading metadata.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for reconciliation and changelog operations.
pub type Result<T> = std::result::Result<T, ReconcileError>;
