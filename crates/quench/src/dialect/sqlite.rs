//! SQLite dialect.
//!
//! SQLite stores values by affinity rather than strict type, so the
//! compatibility table is broader than Postgres': every integer-affinity
//! name satisfies all the integer-backed categories.

use crate::definition::{ColumnType, TypeCategory};
use crate::error::Result;

use super::{SchemaDialect, TypeCompat};

/// SQLite schema dialect.
#[derive(Debug)]
pub struct SqliteDialect {
    compat: TypeCompat,
}

impl Default for SqliteDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub fn new() -> Self {
        const INTEGERS: &[TypeCategory] = &[
            TypeCategory::Integer,
            TypeCategory::Long,
            TypeCategory::Enumeration,
            TypeCategory::Boolean,
        ];
        let compat = TypeCompat::new(&[
            ("integer", INTEGERS),
            ("int", INTEGERS),
            ("bigint", INTEGERS),
            ("varchar", &[TypeCategory::Text]),
            (
                "text",
                &[
                    TypeCategory::Text,
                    TypeCategory::Date,
                    TypeCategory::DateTime,
                    TypeCategory::Uuid,
                ],
            ),
            ("date", &[TypeCategory::Date]),
            ("datetime", &[TypeCategory::DateTime]),
            ("numeric", &[TypeCategory::Decimal]),
            ("decimal", &[TypeCategory::Decimal]),
            ("boolean", &[TypeCategory::Boolean]),
            ("blob", &[TypeCategory::Blob, TypeCategory::Binary]),
        ]);
        Self { compat }
    }
}

impl SchemaDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn type_sql(&self, ty: &ColumnType) -> Result<String> {
        let sql = match ty {
            ColumnType::Integer
            | ColumnType::Long
            | ColumnType::Enumeration
            | ColumnType::Boolean => "INTEGER".to_string(),
            ColumnType::Text { length } => match length {
                Some(n @ 1..=255) => format!("VARCHAR({n})"),
                _ => "TEXT".to_string(),
            },
            ColumnType::Decimal { .. } => "NUMERIC".to_string(),
            ColumnType::Date | ColumnType::DateTime | ColumnType::Uuid => "TEXT".to_string(),
            ColumnType::Blob | ColumnType::Binary { .. } => "BLOB".to_string(),
            ColumnType::Reference { ty, .. } => self.type_sql(ty)?,
        };
        Ok(sql)
    }

    // Auto-increment columns ride on the implicit rowid; no special type
    // is emitted.

    fn compatibility(&self) -> &TypeCompat {
        &self.compat
    }

    fn tables_query(&self) -> &'static str {
        "SELECT name FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
         ORDER BY name"
    }

    fn columns_query(&self) -> &'static str {
        r#"SELECT name, type AS type_name, "notnull" = 0 AS nullable, NULL AS size
           FROM pragma_table_info(?)"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dialect() -> SqliteDialect {
        SqliteDialect::new()
    }

    #[test]
    fn test_type_sql_affinities() {
        let d = dialect();
        assert_eq!(d.type_sql(&ColumnType::Integer).unwrap(), "INTEGER");
        assert_eq!(d.type_sql(&ColumnType::Long).unwrap(), "INTEGER");
        assert_eq!(d.type_sql(&ColumnType::Boolean).unwrap(), "INTEGER");
        assert_eq!(d.type_sql(&ColumnType::varchar(100)).unwrap(), "VARCHAR(100)");
        assert_eq!(d.type_sql(&ColumnType::text()).unwrap(), "TEXT");
        assert_eq!(d.type_sql(&ColumnType::DateTime).unwrap(), "TEXT");
        assert_eq!(d.type_sql(&ColumnType::Blob).unwrap(), "BLOB");
    }

    #[test]
    fn test_integer_affinity_satisfies_long() {
        let d = dialect();
        let categories = d.compatibility().categories("INTEGER").unwrap();
        assert!(categories.contains(&TypeCategory::Integer));
        assert!(categories.contains(&TypeCategory::Long));
        assert!(categories.contains(&TypeCategory::Enumeration));
    }

    #[test]
    fn test_auto_increment_column_renders_plain_integer() {
        use crate::definition::ColumnDef;
        let col = ColumnDef::new("id", ColumnType::Integer).auto_increment();
        assert_eq!(dialect().column_sql(&col).unwrap(), "id INTEGER NOT NULL");
    }

    #[test]
    fn test_no_constraint_introspection() {
        assert!(dialect().constraint_names_query().is_none());
    }
}
