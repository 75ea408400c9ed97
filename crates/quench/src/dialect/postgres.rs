//! PostgreSQL dialect.

use crate::definition::{ColumnDef, ColumnType, TypeCategory};
use crate::error::{ReconcileError, Result};

use super::{SchemaDialect, TypeCompat};

/// PostgreSQL schema dialect.
///
/// Auto-increment columns render as SERIAL/BIGSERIAL; the compatibility
/// table maps the `udt_name` spellings reported by the catalog (`int4`,
/// `bpchar`, `bytea`, ...).
#[derive(Debug)]
pub struct PostgresDialect {
    compat: TypeCompat,
}

impl Default for PostgresDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl PostgresDialect {
    /// Creates a new Postgres dialect.
    #[must_use]
    pub fn new() -> Self {
        let compat = TypeCompat::new(&[
            ("serial", &[TypeCategory::Integer]),
            ("bigserial", &[TypeCategory::Long]),
            ("varchar", &[TypeCategory::Text]),
            ("bpchar", &[TypeCategory::Text]),
            ("int4", &[TypeCategory::Enumeration, TypeCategory::Integer]),
            ("numeric", &[TypeCategory::Decimal]),
            ("int8", &[TypeCategory::Long]),
            ("date", &[TypeCategory::Date]),
            ("bool", &[TypeCategory::Boolean]),
            ("timestamp", &[TypeCategory::DateTime]),
            ("text", &[TypeCategory::Text]),
            ("bytea", &[TypeCategory::Blob, TypeCategory::Binary]),
            ("uuid", &[TypeCategory::Uuid]),
        ]);
        Self { compat }
    }
}

impl SchemaDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn type_sql(&self, ty: &ColumnType) -> Result<String> {
        let sql = match ty {
            ColumnType::Integer | ColumnType::Enumeration => "INT".to_string(),
            ColumnType::Long => "BIGINT".to_string(),
            ColumnType::Text { length } => match length {
                Some(n @ 1..=255) => format!("VARCHAR({n})"),
                _ => "TEXT".to_string(),
            },
            ColumnType::Decimal { precision, scale } => format!("DECIMAL({precision}, {scale})"),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::DateTime => "TIMESTAMP".to_string(),
            ColumnType::Boolean => "BOOLEAN".to_string(),
            ColumnType::Blob | ColumnType::Binary { .. } => "BYTEA".to_string(),
            ColumnType::Uuid => "UUID".to_string(),
            ColumnType::Reference { ty, .. } => self.type_sql(ty)?,
        };
        Ok(sql)
    }

    fn column_type_sql(&self, column: &ColumnDef) -> Result<String> {
        if column.auto_increment {
            if column.nullable {
                return Err(ReconcileError::UnsupportedColumn(format!(
                    "column {} cannot be both AUTOINCREMENT and NULL",
                    column.name
                )));
            }
            return match column.ty {
                ColumnType::Integer => Ok("SERIAL".to_string()),
                ColumnType::Long => Ok("BIGSERIAL".to_string()),
                _ => Err(ReconcileError::UnsupportedColumn(format!(
                    "AutoIncrement column {} requires an integer type",
                    column.name
                ))),
            };
        }
        self.type_sql(&column.ty)
    }

    fn compatibility(&self) -> &TypeCompat {
        &self.compat
    }

    fn tables_query(&self) -> &'static str {
        "SELECT table_name FROM information_schema.tables \
         WHERE table_schema = current_schema() AND table_type = 'BASE TABLE' \
         ORDER BY table_name"
    }

    fn columns_query(&self) -> &'static str {
        "SELECT column_name AS name, udt_name AS type_name, \
         is_nullable = 'YES' AS nullable, character_maximum_length AS size \
         FROM information_schema.columns \
         WHERE table_schema = current_schema() AND table_name = $1 \
         ORDER BY ordinal_position"
    }

    fn constraint_names_query(&self) -> Option<&'static str> {
        Some(
            "SELECT tc.constraint_name \
             FROM information_schema.table_constraints AS tc \
             JOIN information_schema.key_column_usage AS kcu \
             ON tc.constraint_name = kcu.constraint_name \
             JOIN information_schema.constraint_column_usage AS ccu \
             ON ccu.constraint_name = tc.constraint_name \
             WHERE constraint_type = 'FOREIGN KEY'",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dialect() -> PostgresDialect {
        PostgresDialect::new()
    }

    #[test]
    fn test_type_sql() {
        let d = dialect();
        assert_eq!(d.type_sql(&ColumnType::Integer).unwrap(), "INT");
        assert_eq!(d.type_sql(&ColumnType::Long).unwrap(), "BIGINT");
        assert_eq!(d.type_sql(&ColumnType::Enumeration).unwrap(), "INT");
        assert_eq!(d.type_sql(&ColumnType::varchar(100)).unwrap(), "VARCHAR(100)");
        assert_eq!(d.type_sql(&ColumnType::varchar(1000)).unwrap(), "TEXT");
        assert_eq!(d.type_sql(&ColumnType::text()).unwrap(), "TEXT");
        assert_eq!(
            d.type_sql(&ColumnType::Decimal {
                precision: 10,
                scale: 2
            })
            .unwrap(),
            "DECIMAL(10, 2)"
        );
        assert_eq!(d.type_sql(&ColumnType::DateTime).unwrap(), "TIMESTAMP");
        assert_eq!(d.type_sql(&ColumnType::Blob).unwrap(), "BYTEA");
        assert_eq!(d.type_sql(&ColumnType::Uuid).unwrap(), "UUID");
    }

    #[test]
    fn test_reference_renders_as_target_type() {
        let d = dialect();
        let ty = ColumnType::Reference {
            table: "users".to_string(),
            column: "id".to_string(),
            ty: Box::new(ColumnType::Long),
        };
        assert_eq!(d.type_sql(&ty).unwrap(), "BIGINT");
    }

    #[test]
    fn test_auto_increment_renders_serial() {
        let d = dialect();
        let int_col = ColumnDef::new("id", ColumnType::Integer).auto_increment();
        assert_eq!(d.column_type_sql(&int_col).unwrap(), "SERIAL");

        let long_col = ColumnDef::new("id", ColumnType::Long).auto_increment();
        assert_eq!(d.column_type_sql(&long_col).unwrap(), "BIGSERIAL");
    }

    #[test]
    fn test_auto_increment_rejects_non_integer() {
        let d = dialect();
        let col = ColumnDef::new("id", ColumnType::text()).auto_increment();
        assert!(matches!(
            d.column_type_sql(&col),
            Err(ReconcileError::UnsupportedColumn(_))
        ));
    }

    #[test]
    fn test_auto_increment_rejects_nullable() {
        let d = dialect();
        let col = ColumnDef::new("id", ColumnType::Integer)
            .auto_increment()
            .nullable();
        assert!(matches!(
            d.column_type_sql(&col),
            Err(ReconcileError::UnsupportedColumn(_))
        ));
    }

    #[test]
    fn test_column_sql() {
        let d = dialect();
        let col = ColumnDef::new("name", ColumnType::varchar(20));
        assert_eq!(d.column_sql(&col).unwrap(), "name VARCHAR(20) NOT NULL");

        let col = ColumnDef::new("note", ColumnType::text()).nullable();
        assert_eq!(d.column_sql(&col).unwrap(), "note TEXT NULL");

        let col = ColumnDef::new("created", ColumnType::DateTime).now();
        assert_eq!(
            d.column_sql(&col).unwrap(),
            "created TIMESTAMP NOT NULL DEFAULT current_timestamp"
        );

        let col = ColumnDef::new("active", ColumnType::Boolean)
            .default(crate::definition::DefaultValue::Bool(true));
        assert_eq!(
            d.column_sql(&col).unwrap(),
            "active BOOLEAN NOT NULL DEFAULT TRUE"
        );
    }

    #[test]
    fn test_int4_is_compatible_with_enumeration() {
        let d = dialect();
        let categories = d.compatibility().categories("int4").unwrap();
        assert!(categories.contains(&TypeCategory::Enumeration));
        assert!(categories.contains(&TypeCategory::Integer));
        assert!(!categories.contains(&TypeCategory::Long));
    }

    #[test]
    fn test_unknown_type_has_no_entry() {
        assert!(dialect().compatibility().categories("hstore").is_none());
    }

    #[test]
    fn test_introspection_targets_information_schema() {
        let d = dialect();
        assert!(d.tables_query().contains("information_schema.tables"));
        assert!(d.columns_query().contains("information_schema.columns"));
        assert!(d
            .constraint_names_query()
            .unwrap()
            .contains("constraint_type = 'FOREIGN KEY'"));
    }
}
