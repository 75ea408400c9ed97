//! Live schema snapshots.
//!
//! The snapshot reader queries database metadata and produces a normalized,
//! point-in-time view of tables and columns. Nothing is cached: every call
//! re-queries the engine.

use std::collections::HashSet;

use sqlx::sqlite::SqlitePool;

use crate::dialect::SchemaDialect;
use crate::error::Result;

/// A column as reported by the live database.
#[derive(Debug, Clone)]
pub struct SnapshotColumn {
    /// Column name as reported by the engine.
    pub name: String,
    /// Whether the column allows NULL.
    pub nullable: bool,
    /// Normalized raw type name: lowercased, size suffix stripped.
    pub type_name: String,
    /// Reported size, if any (falls back to a `(n)` suffix in the declared
    /// type text, which is how SQLite reports VARCHAR lengths).
    pub size: Option<u32>,
}

impl SnapshotColumn {
    /// Builds a column from raw engine-reported values.
    #[must_use]
    pub fn from_raw(name: String, nullable: bool, raw_type: &str, size: Option<i64>) -> Self {
        let (type_name, declared_size) = split_declared_type(raw_type);
        Self {
            name,
            nullable,
            type_name,
            size: size
                .and_then(|n| u32::try_from(n).ok())
                .or(declared_size),
        }
    }
}

/// Splits a declared type text into a lowercase base name and an optional
/// leading size: `"VARCHAR(100)"` becomes `("varchar", Some(100))`.
#[must_use]
pub fn split_declared_type(raw: &str) -> (String, Option<u32>) {
    let raw = raw.trim();
    match raw.split_once('(') {
        Some((base, rest)) => {
            let size = rest
                .trim_end_matches(')')
                .split(',')
                .next()
                .and_then(|n| n.trim().parse().ok());
            (base.trim().to_lowercase(), size)
        }
        None => (raw.to_lowercase(), None),
    }
}

/// A table as reported by the live database.
#[derive(Debug, Clone)]
pub struct SnapshotTable {
    /// Table name as reported by the engine.
    pub name: String,
    /// Columns, in engine order.
    pub columns: Vec<SnapshotColumn>,
}

impl SnapshotTable {
    /// Finds a column by case-insensitive name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&SnapshotColumn> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// A point-in-time view of the live schema.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    tables: Vec<SnapshotTable>,
}

impl Snapshot {
    /// Builds a snapshot from tables (test and planning entry point).
    #[must_use]
    pub fn from_tables(tables: Vec<SnapshotTable>) -> Self {
        Self { tables }
    }

    /// Finds a table by case-insensitive name.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&SnapshotTable> {
        self.tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Iterates over all tables.
    pub fn tables(&self) -> impl Iterator<Item = &SnapshotTable> {
        self.tables.iter()
    }

    /// Returns true if no tables were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Reads live schema metadata through a dialect's introspection queries.
pub struct SnapshotReader<'a, D: SchemaDialect> {
    pool: &'a SqlitePool,
    dialect: &'a D,
}

impl<'a, D: SchemaDialect> SnapshotReader<'a, D> {
    /// Creates a new reader.
    #[must_use]
    pub fn new(pool: &'a SqlitePool, dialect: &'a D) -> Self {
        Self { pool, dialect }
    }

    /// Reads the current set of tables and their columns.
    pub async fn tables(&self) -> Result<Snapshot> {
        let names: Vec<(String,)> = sqlx::query_as(self.dialect.tables_query())
            .fetch_all(self.pool)
            .await?;

        let mut tables = Vec::with_capacity(names.len());
        for (name,) in names {
            let rows: Vec<(String, String, bool, Option<i64>)> =
                sqlx::query_as(self.dialect.columns_query())
                    .bind(&name)
                    .fetch_all(self.pool)
                    .await?;

            let columns = rows
                .into_iter()
                .map(|(col, type_name, nullable, size)| {
                    SnapshotColumn::from_raw(col, nullable, &type_name, size)
                })
                .collect();
            tables.push(SnapshotTable { name, columns });
        }
        Ok(Snapshot::from_tables(tables))
    }

    /// Reads the names of all live FOREIGN KEY constraints, lowercased.
    ///
    /// Empty when the dialect has no named-constraint introspection.
    pub async fn constraint_names(&self) -> Result<HashSet<String>> {
        let Some(query) = self.dialect.constraint_names_query() else {
            return Ok(HashSet::new());
        };
        let rows: Vec<(String,)> = sqlx::query_as(query).fetch_all(self.pool).await?;
        Ok(rows.into_iter().map(|(n,)| n.to_lowercase()).collect())
    }
}
