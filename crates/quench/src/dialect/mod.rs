//! Database dialect implementations.
//!
//! A dialect renders declared columns to engine-specific SQL, supplies the
//! metadata queries the snapshot reader runs, and carries the type
//! compatibility table used to decide whether a live column already
//! satisfies a declared one.

mod postgres;
mod sqlite;

pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

use std::collections::HashMap;

use crate::definition::{ColumnDef, ColumnType, TypeCategory};
use crate::error::{ReconcileError, Result};
use crate::statement::SqlBuilder;

/// Maps engine-reported raw type names to the logical type categories they
/// satisfy.
///
/// Constructed once per dialect instance. Every entry implicitly includes
/// [`TypeCategory::Reference`], since a reference column's stored type
/// equals its referenced column's type.
#[derive(Debug)]
pub struct TypeCompat {
    entries: HashMap<String, Vec<TypeCategory>>,
}

impl TypeCompat {
    /// Builds the table from (raw name, categories) pairs.
    #[must_use]
    pub fn new(entries: &[(&str, &[TypeCategory])]) -> Self {
        let entries = entries
            .iter()
            .map(|(name, categories)| {
                let mut categories = categories.to_vec();
                if !categories.contains(&TypeCategory::Reference) {
                    categories.push(TypeCategory::Reference);
                }
                (name.to_lowercase(), categories)
            })
            .collect();
        Self { entries }
    }

    /// Returns the categories a raw type name satisfies, if known.
    #[must_use]
    pub fn categories(&self, raw_type: &str) -> Option<&[TypeCategory]> {
        self.entries
            .get(&raw_type.to_lowercase())
            .map(Vec::as_slice)
    }
}

/// Engine-specific SQL rendering and metadata access.
pub trait SchemaDialect: Send + Sync {
    /// Returns the dialect name.
    fn name(&self) -> &'static str;

    /// Returns the SQL type text for a logical type.
    fn type_sql(&self, ty: &ColumnType) -> Result<String>;

    /// Returns the SQL type text for a column, taking auto-increment
    /// rendering into account (e.g. SERIAL on Postgres).
    fn column_type_sql(&self, column: &ColumnDef) -> Result<String> {
        self.type_sql(&column.ty)
    }

    /// Appends nullability, default and now-on-insert property SQL for a
    /// column. Auto-increment rendering is a type concern, handled by
    /// [`SchemaDialect::column_type_sql`].
    fn append_column_properties(
        &self,
        builder: &mut SqlBuilder,
        column: &ColumnDef,
    ) -> Result<()> {
        if column.auto_increment && column.nullable {
            return Err(ReconcileError::UnsupportedColumn(format!(
                "column {} cannot be both AUTOINCREMENT and NULL",
                column.name
            )));
        }
        if column.nullable {
            builder.append(" NULL");
        } else {
            builder.append(" NOT NULL");
        }
        if let Some(default) = &column.default {
            builder.append(" DEFAULT ");
            builder.append(default.to_sql());
        }
        if column.now_on_insert {
            builder.append(" DEFAULT current_timestamp");
        }
        Ok(())
    }

    /// Renders a full column definition: name, type and properties.
    fn column_sql(&self, column: &ColumnDef) -> Result<String> {
        let mut builder = SqlBuilder::new();
        builder.append(&column.name);
        builder.append(" ");
        builder.append(self.column_type_sql(column)?);
        self.append_column_properties(&mut builder, column)?;
        Ok(builder.build())
    }

    /// Returns the type compatibility table.
    fn compatibility(&self) -> &TypeCompat;

    /// Query returning the names of all tables in the current schema, one
    /// text column per row.
    fn tables_query(&self) -> &'static str;

    /// Query returning the columns of a table (bound as the single
    /// parameter), with the row shape (name, type_name, nullable, size).
    fn columns_query(&self) -> &'static str;

    /// Query returning the names of all live FOREIGN KEY constraints, one
    /// text column per row, or `None` when the engine has no named
    /// constraint introspection.
    fn constraint_names_query(&self) -> Option<&'static str> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compat_lookup_is_case_insensitive() {
        let compat = TypeCompat::new(&[("int4", &[TypeCategory::Integer])]);
        assert!(compat.categories("INT4").is_some());
        assert!(compat.categories("int4").is_some());
        assert!(compat.categories("int16").is_none());
    }

    #[test]
    fn test_compat_always_includes_reference() {
        let compat = TypeCompat::new(&[("int8", &[TypeCategory::Long])]);
        let categories = compat.categories("int8").unwrap();
        assert!(categories.contains(&TypeCategory::Reference));
        assert!(categories.contains(&TypeCategory::Long));
    }
}
