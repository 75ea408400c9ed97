//! Changelog ledger.
//!
//! Changesets are named, ordered lists of literal SQL statements. The
//! ledger records each applied statement under its (sequence, changeset
//! name) identity in a self-provisioning `changelog` table, skips
//! statements already on record, and refuses to proceed when a recorded
//! statement's text has changed.

use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::sqlite::SqlitePool;
use tracing::{debug, info};

use crate::error::{ReconcileError, Result};

const CHANGELOG_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS changelog ( \
    vid INTEGER NOT NULL, \
    name VARCHAR(20) NOT NULL, \
    query TEXT NOT NULL, \
    applied_at TEXT NOT NULL, \
    PRIMARY KEY (vid, name) \
)";

/// One recorded ledger row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeLogEntry {
    /// Sequence number within the changeset.
    pub vid: i32,
    /// Changeset name.
    pub name: String,
    /// Recorded SQL text.
    pub query: String,
    /// When the statement was applied.
    pub applied_at: DateTime<Utc>,
}

/// A named, ordered list of (sequence, SQL) statements.
#[derive(Debug, Clone)]
pub struct Changeset {
    name: String,
    statements: Vec<(i32, String)>,
}

impl Changeset {
    /// Starts building a changeset with the given name.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ChangesetBuilder {
        ChangesetBuilder {
            name: name.into(),
            statements: Vec::new(),
        }
    }

    /// Returns the changeset name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared (sequence, SQL) pairs in ascending order.
    #[must_use]
    pub fn statements(&self) -> &[(i32, String)] {
        &self.statements
    }
}

/// Builds a [`Changeset`], assigning sequence numbers.
///
/// Sequence numbers are strictly ascending. Auto-assignment continues
/// after the highest number so far; a manual pin must exceed it, which
/// also rules out duplicates. Violations surface at build time, before
/// anything executes.
#[derive(Debug)]
pub struct ChangesetBuilder {
    name: String,
    statements: Vec<(i32, String)>,
}

impl ChangesetBuilder {
    fn highest_vid(&self) -> i32 {
        self.statements.last().map_or(0, |(vid, _)| *vid)
    }

    /// Adds a statement with the next sequence number.
    #[must_use]
    pub fn statement(mut self, sql: impl Into<String>) -> Self {
        let vid = self.highest_vid() + 1;
        self.statements.push((vid, sql.into()));
        self
    }

    /// Adds a statement with a manually pinned sequence number.
    pub fn statement_at(mut self, vid: i32, sql: impl Into<String>) -> Result<Self> {
        let highest = self.highest_vid();
        if self.statements.iter().any(|(v, _)| *v == vid) {
            return Err(ReconcileError::InvalidSequence {
                changeset: self.name.clone(),
                vid,
                reason: "sequence number is already assigned".to_string(),
            });
        }
        if vid <= highest {
            return Err(ReconcileError::InvalidSequence {
                changeset: self.name.clone(),
                vid,
                reason: format!("sequence number must exceed the highest assigned ({highest})"),
            });
        }
        self.statements.push((vid, sql.into()));
        Ok(self)
    }

    /// Finishes the changeset.
    #[must_use]
    pub fn build(self) -> Changeset {
        Changeset {
            name: self.name,
            statements: self.statements,
        }
    }
}

/// Persistent record of applied changeset statements.
pub struct ChangeLog {
    pool: SqlitePool,
}

impl ChangeLog {
    /// Creates a ledger over the given pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates the ledger table if it does not exist yet.
    async fn ensure_table(&self) -> Result<()> {
        sqlx::query(CHANGELOG_TABLE_SQL).execute(&self.pool).await?;
        Ok(())
    }

    /// Applies a changeset and returns all entries now on record for its
    /// name, ordered by sequence.
    ///
    /// Each declared statement is handled in ascending order: statements
    /// not yet recorded are executed then recorded; statements already
    /// recorded with identical text are skipped; a recorded statement
    /// whose text differs fails with
    /// [`ReconcileError::ChangesetConflict`] before anything further
    /// executes. A mid-apply execution failure halts the run; entries
    /// recorded before it stay recorded.
    pub async fn apply(&self, changeset: &Changeset) -> Result<Vec<ChangeLogEntry>> {
        self.ensure_table().await?;

        let recorded: Vec<(i32, String, String)> =
            sqlx::query_as("SELECT vid, name, query FROM changelog")
                .fetch_all(&self.pool)
                .await?;

        let mut executed = 0;
        for (vid, sql) in changeset.statements() {
            let existing = recorded
                .iter()
                .find(|(v, n, _)| v == vid && n == changeset.name());
            match existing {
                None => {
                    debug!(changeset = changeset.name(), vid, sql = %sql, "Applying changelog statement");
                    sqlx::query(sql).execute(&self.pool).await?;
                    sqlx::query(
                        "INSERT INTO changelog (vid, name, query, applied_at) VALUES (?, ?, ?, ?)",
                    )
                    .bind(vid)
                    .bind(changeset.name())
                    .bind(sql)
                    .bind(Utc::now().to_rfc3339())
                    .execute(&self.pool)
                    .await?;
                    executed += 1;
                }
                Some((_, _, query)) if query != sql => {
                    return Err(ReconcileError::ChangesetConflict {
                        changeset: changeset.name().to_string(),
                        vid: *vid,
                        recorded: query.clone(),
                        incoming: sql.clone(),
                    });
                }
                Some(_) => {
                    debug!(changeset = changeset.name(), vid, "Statement already applied, skipping");
                }
            }
        }
        info!(
            changeset = changeset.name(),
            executed, "Changeset applied"
        );
        self.entries_for(changeset.name()).await
    }

    /// Returns all recorded entries for a changeset name, ordered by
    /// sequence.
    pub async fn entries_for(&self, name: &str) -> Result<Vec<ChangeLogEntry>> {
        self.ensure_table().await?;
        let rows: Vec<(i32, String, String, String)> = sqlx::query_as(
            "SELECT vid, name, query, applied_at FROM changelog WHERE name = ? ORDER BY vid",
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(vid, name, query, applied_at)| ChangeLogEntry {
                vid,
                name,
                query,
                applied_at: parse_timestamp(&applied_at),
            })
            .collect())
    }

    /// Deletes every entry recorded under a changeset name.
    ///
    /// Used for controlled re-runs; the statements themselves are not
    /// reverted.
    pub async fn clear_changeset(&self, name: &str) -> Result<()> {
        self.ensure_table().await?;
        sqlx::query("DELETE FROM changelog WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Drops the ledger table entirely. Irreversible.
    pub async fn drop_ledger_table(&self) -> Result<()> {
        sqlx::query("DROP TABLE IF EXISTS changelog")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|naive| naive.and_utc())
        })
        .unwrap_or_else(|_| Utc::now())
}
