//! Schema reconciliation.
//!
//! The reconciler diffs declared tables against a live snapshot and emits
//! the DDL needed to close the gap, in three phases: CREATE TABLE plus
//! index statements for missing tables, ALTER statements for existing
//! tables, then missing FOREIGN KEY constraint additions. Declared-table
//! order is preserved within each phase.

use std::collections::HashSet;

use sqlx::sqlite::SqlitePool;
use tracing::{debug, info};

use crate::definition::{ColumnDef, ColumnType, ForeignKeyDef, IndexDef, TableDef, TypeCategory};
use crate::dialect::SchemaDialect;
use crate::error::{ReconcileError, Result};
use crate::snapshot::{Snapshot, SnapshotColumn, SnapshotReader, SnapshotTable};
use crate::statement::SqlBuilder;

/// Reconciliation behavior toggles.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileOptions {
    /// Whether existing tables may be altered. When disabled, only missing
    /// tables and missing foreign keys produce statements.
    pub alter_tables: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self { alter_tables: true }
    }
}

/// One advisory drift finding from [`Reconciler::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationItem {
    /// Table the finding concerns.
    pub table: String,
    /// Human-readable description of the drift.
    pub message: String,
}

impl std::fmt::Display for ValidationItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.table, self.message)
    }
}

/// Diffs declared tables against the live schema and applies the result.
pub struct Reconciler<D: SchemaDialect> {
    pool: SqlitePool,
    dialect: D,
    options: ReconcileOptions,
}

impl<D: SchemaDialect> Reconciler<D> {
    /// Creates a reconciler with default options.
    #[must_use]
    pub fn new(pool: SqlitePool, dialect: D) -> Self {
        Self {
            pool,
            dialect,
            options: ReconcileOptions::default(),
        }
    }

    /// Overrides the reconciliation options.
    #[must_use]
    pub fn with_options(mut self, options: ReconcileOptions) -> Self {
        self.options = options;
        self
    }

    /// Reads the live schema and plans the statements needed to make it
    /// match the declared tables.
    pub async fn reconcile(&self, tables: &[TableDef]) -> Result<Vec<String>> {
        let reader = SnapshotReader::new(&self.pool, &self.dialect);
        let snapshot = reader.tables().await?;
        let constraints = reader.constraint_names().await?;
        self.plan(tables, &snapshot, &constraints)
    }

    /// Plans and executes the reconciliation statements, one at a time.
    ///
    /// Statements run sequentially; the first failure halts the run and
    /// surfaces unchanged. Returns the statements that were executed.
    pub async fn apply(&self, tables: &[TableDef]) -> Result<Vec<String>> {
        let statements = self.reconcile(tables).await?;
        info!(
            statements = statements.len(),
            dialect = self.dialect.name(),
            "Applying schema reconciliation"
        );
        for sql in &statements {
            debug!(sql = %sql, "Executing DDL statement");
            sqlx::query(sql).execute(&self.pool).await?;
        }
        Ok(statements)
    }

    /// Drops every declared table. Irreversible.
    pub async fn drop_tables(&self, tables: &[TableDef]) -> Result<()> {
        for table in tables {
            let sql = format!("DROP TABLE {}", table.name);
            debug!(sql = %sql, "Dropping table");
            sqlx::query(&sql).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Reports drift between the declared tables and the live schema
    /// without emitting DDL. Findings are advisory, never errors.
    pub async fn validate(&self, tables: &[TableDef]) -> Result<Vec<ValidationItem>> {
        let reader = SnapshotReader::new(&self.pool, &self.dialect);
        let snapshot = reader.tables().await?;
        let mut items = Vec::new();

        for table in tables {
            let Some(live) = snapshot.table(&table.name) else {
                items.push(ValidationItem {
                    table: table.name.clone(),
                    message: "table is missing from the database".to_string(),
                });
                continue;
            };
            for column in &table.columns {
                if live.column(&column.name).is_none() {
                    items.push(ValidationItem {
                        table: table.name.clone(),
                        message: format!("column {} is missing from the database", column.name),
                    });
                }
            }
            for live_column in &live.columns {
                if table.get_column(&live_column.name).is_none() {
                    items.push(ValidationItem {
                        table: table.name.clone(),
                        message: format!(
                            "column {} exists in the database but is not declared",
                            live_column.name
                        ),
                    });
                }
            }
        }

        for live in snapshot.tables() {
            let declared = tables
                .iter()
                .any(|t| t.name.eq_ignore_ascii_case(&live.name));
            if !declared {
                items.push(ValidationItem {
                    table: live.name.clone(),
                    message: "table exists in the database but is not declared".to_string(),
                });
            }
        }
        Ok(items)
    }

    /// Pure planning step: computes the statement list from a snapshot and
    /// the set of live foreign-key constraint names (lowercased).
    pub fn plan(
        &self,
        tables: &[TableDef],
        snapshot: &Snapshot,
        live_constraints: &HashSet<String>,
    ) -> Result<Vec<String>> {
        let mut creates = Vec::new();
        let mut alters = Vec::new();
        let mut fk_adds = Vec::new();

        for table in tables {
            match snapshot.table(&table.name) {
                // A table created in this pass is fully formed and never
                // enters the alteration branch.
                None => {
                    creates.push(self.create_table_sql(table)?);
                    for index in &table.indices {
                        creates.push(index_sql(table, index));
                    }
                }
                Some(live) if self.options.alter_tables => {
                    self.plan_alterations(table, live, &mut alters)?;
                }
                Some(_) => {}
            }

            for fk in &table.foreign_keys {
                if !live_constraints.contains(&fk.name.to_lowercase()) {
                    fk_adds.push(foreign_key_sql(table, fk));
                }
            }
        }

        creates.extend(alters);
        creates.extend(fk_adds);
        Ok(creates)
    }

    fn plan_alterations(
        &self,
        table: &TableDef,
        live: &SnapshotTable,
        out: &mut Vec<String>,
    ) -> Result<()> {
        for column in &table.columns {
            match live.column(&column.name) {
                None => match &column.renamed_from {
                    Some(old) => out.push(format!(
                        "ALTER TABLE {} RENAME COLUMN {} TO {}",
                        table.name, old, column.name
                    )),
                    None => out.push(format!(
                        "ALTER TABLE {} ADD COLUMN {}",
                        table.name,
                        self.dialect.column_sql(column)?
                    )),
                },
                Some(live_column) => {
                    if let Some(sql) = self.column_change_sql(table, column, live_column)? {
                        out.push(sql);
                    }
                }
            }
        }
        Ok(())
    }

    /// Decides whether an existing column needs a type or size change.
    ///
    /// A type mismatch takes priority; the VARCHAR size is only compared
    /// once the live type already satisfies the declared category.
    fn column_change_sql(
        &self,
        table: &TableDef,
        column: &ColumnDef,
        live: &SnapshotColumn,
    ) -> Result<Option<String>> {
        let categories = self
            .dialect
            .compatibility()
            .categories(&live.type_name)
            .ok_or_else(|| ReconcileError::UnknownDbType {
                dialect: self.dialect.name(),
                type_name: live.type_name.clone(),
            })?;

        let category = column.ty.category();
        if !categories.contains(&category) {
            let type_sql = self.dialect.type_sql(&column.ty)?;
            let mut builder = SqlBuilder::new();
            builder.append(format!(
                "ALTER TABLE {} ALTER COLUMN {} TYPE {}",
                table.name, column.name, type_sql
            ));
            // Integer-backed targets need an explicit cast to keep the
            // existing data convertible.
            if matches!(
                category,
                TypeCategory::Integer | TypeCategory::Long | TypeCategory::Enumeration
            ) {
                builder.append(format!(" USING {}::{}", column.name, type_sql));
            }
            return Ok(Some(builder.build()));
        }

        if let ColumnType::Text { length: Some(n) } = resolved_type(&column.ty) {
            if (1..=255).contains(n) && live.size != Some(*n) {
                return Ok(Some(format!(
                    "ALTER TABLE {} ALTER COLUMN {} TYPE VARCHAR({n})",
                    table.name, column.name
                )));
            }
        }
        Ok(None)
    }

    fn create_table_sql(&self, table: &TableDef) -> Result<String> {
        let mut builder = SqlBuilder::new();
        builder.append(format!("CREATE TABLE IF NOT EXISTS {} (", table.name));

        let mut columns = Vec::with_capacity(table.columns.len());
        for column in &table.columns {
            columns.push(self.dialect.column_sql(column)?);
        }
        builder.append_joined(&columns, ", ");

        if let Some(pk) = table.effective_primary_key() {
            builder.append(format!(
                ", CONSTRAINT {} PRIMARY KEY ({})",
                pk.name,
                pk.columns.join(", ")
            ));
        }
        builder.append(")");
        Ok(builder.build())
    }
}

/// Resolves a reference chain down to the stored type.
fn resolved_type(ty: &ColumnType) -> &ColumnType {
    match ty {
        ColumnType::Reference { ty, .. } => resolved_type(ty),
        other => other,
    }
}

fn index_sql(table: &TableDef, index: &IndexDef) -> String {
    let unique = if index.unique { "UNIQUE " } else { "" };
    format!(
        "CREATE {unique}INDEX IF NOT EXISTS {} ON {} ({})",
        index.name,
        table.name,
        index.columns.join(", ")
    )
}

fn foreign_key_sql(table: &TableDef, fk: &ForeignKeyDef) -> String {
    format!(
        "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}({})",
        table.name,
        fk.name,
        fk.columns.join(", "),
        fk.references_table,
        fk.references_columns.join(", ")
    )
}
