//! Declared schema model.
//!
//! These types describe the tables an application expects to exist. The
//! reconciler compares them against a live database snapshot and emits the
//! DDL needed to close the gap.

use serde::{Deserialize, Serialize};

/// Logical column types, independent of any engine's native type names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    /// Integer (32-bit).
    Integer,
    /// Big integer (64-bit).
    Long,
    /// Text, optionally length-bounded. Lengths in `1..=255` render as
    /// `VARCHAR(n)`, anything else as unbounded text.
    Text {
        /// Maximum length in characters, if bounded.
        length: Option<u32>,
    },
    /// Fixed-point decimal.
    Decimal {
        /// Total number of digits.
        precision: u8,
        /// Digits after the decimal point.
        scale: u8,
    },
    /// Date only.
    Date,
    /// Date and time.
    DateTime,
    /// Boolean.
    Boolean,
    /// Binary large object.
    Blob,
    /// Binary data with a maximum length.
    Binary {
        /// Maximum length in bytes.
        length: u32,
    },
    /// UUID.
    Uuid,
    /// Enumeration stored as its integer ordinal.
    Enumeration,
    /// Reference to a column in another table; stored as that column's type.
    Reference {
        /// Referenced table name.
        table: String,
        /// Referenced column name.
        column: String,
        /// Type of the referenced column.
        ty: Box<ColumnType>,
    },
}

/// Abstract category of a logical type, used for compatibility decisions
/// against engine-reported type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    Long,
    /// Character data, bounded or not.
    Text,
    /// Fixed-point decimal.
    Decimal,
    /// Date only.
    Date,
    /// Date and time.
    DateTime,
    /// Boolean.
    Boolean,
    /// Binary large object.
    Blob,
    /// Bounded binary data.
    Binary,
    /// UUID.
    Uuid,
    /// Enumeration stored as an integer.
    Enumeration,
    /// Foreign-key reference column.
    Reference,
}

impl ColumnType {
    /// Returns the category of this type.
    ///
    /// A reference column's effective stored type equals the referenced
    /// column's type, so its category follows the target.
    #[must_use]
    pub fn category(&self) -> TypeCategory {
        match self {
            Self::Integer => TypeCategory::Integer,
            Self::Long => TypeCategory::Long,
            Self::Text { .. } => TypeCategory::Text,
            Self::Decimal { .. } => TypeCategory::Decimal,
            Self::Date => TypeCategory::Date,
            Self::DateTime => TypeCategory::DateTime,
            Self::Boolean => TypeCategory::Boolean,
            Self::Blob => TypeCategory::Blob,
            Self::Binary { .. } => TypeCategory::Binary,
            Self::Uuid => TypeCategory::Uuid,
            Self::Enumeration => TypeCategory::Enumeration,
            Self::Reference { ty, .. } => ty.category(),
        }
    }

    /// Convenience constructor for bounded text.
    #[must_use]
    pub fn varchar(length: u32) -> Self {
        Self::Text {
            length: Some(length),
        }
    }

    /// Convenience constructor for unbounded text.
    #[must_use]
    pub fn text() -> Self {
        Self::Text { length: None }
    }
}

/// Default value for a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DefaultValue {
    /// NULL default.
    Null,
    /// Boolean default.
    Bool(bool),
    /// Integer default.
    Integer(i64),
    /// Float default.
    Float(f64),
    /// String default.
    String(String),
    /// SQL expression (e.g. "CURRENT_TIMESTAMP").
    Expression(String),
}

impl DefaultValue {
    /// Returns the SQL literal for this default value.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::String(s) => format!("'{}'", s.replace('\'', "''")),
            Self::Expression(expr) => expr.clone(),
        }
    }
}

/// A declared column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// Logical type.
    pub ty: ColumnType,
    /// Whether the column allows NULL values.
    pub nullable: bool,
    /// Whether the column auto-increments.
    pub auto_increment: bool,
    /// Default value, if any.
    pub default: Option<DefaultValue>,
    /// Whether the column defaults to the current timestamp on insert.
    pub now_on_insert: bool,
    /// Prior name, when the column is a rename of an existing one.
    pub renamed_from: Option<String>,
}

impl ColumnDef {
    /// Creates a new column with the given name and type.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: false,
            auto_increment: false,
            default: None,
            now_on_insert: false,
            renamed_from: None,
        }
    }

    /// Creates a column referencing another table's column.
    #[must_use]
    pub fn reference(
        name: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
        ty: ColumnType,
    ) -> Self {
        Self::new(
            name,
            ColumnType::Reference {
                table: table.into(),
                column: column.into(),
                ty: Box::new(ty),
            },
        )
    }

    /// Marks the column as nullable.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Marks the column as auto-incrementing.
    #[must_use]
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Defaults the column to the current timestamp on insert.
    #[must_use]
    pub fn now(mut self) -> Self {
        self.now_on_insert = true;
        self
    }

    /// Marks the column as renamed from a prior name.
    ///
    /// During reconciliation a rename-marked column with no live match
    /// produces a RENAME COLUMN statement instead of ADD COLUMN.
    #[must_use]
    pub fn renamed_from(mut self, old_name: impl Into<String>) -> Self {
        self.renamed_from = Some(old_name.into());
        self
    }
}

/// A primary key constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKeyDef {
    /// Constraint name.
    pub name: String,
    /// Columns forming the key.
    pub columns: Vec<String>,
}

/// A foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDef {
    /// Constraint name.
    pub name: String,
    /// Source columns in the declaring table.
    pub columns: Vec<String>,
    /// Referenced table name.
    pub references_table: String,
    /// Referenced columns.
    pub references_columns: Vec<String>,
}

/// An index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDef {
    /// Index name.
    pub name: String,
    /// Indexed columns.
    pub columns: Vec<String>,
    /// Whether the index enforces uniqueness.
    pub unique: bool,
}

/// A declared table: name, ordered columns and constraints.
///
/// Names are case-preserving but always compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDef {
    /// Table name.
    pub name: String,
    /// Column definitions, in declaration order.
    pub columns: Vec<ColumnDef>,
    /// Explicit primary key, if declared. At most one per table.
    pub primary_key: Option<PrimaryKeyDef>,
    /// Foreign key constraints.
    pub foreign_keys: Vec<ForeignKeyDef>,
    /// Index definitions.
    pub indices: Vec<IndexDef>,
}

impl TableDef {
    /// Creates a new table definition.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: None,
            foreign_keys: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Adds a column.
    #[must_use]
    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    /// Declares the primary key. Replaces any previous declaration.
    #[must_use]
    pub fn primary_key(mut self, name: impl Into<String>, columns: Vec<String>) -> Self {
        self.primary_key = Some(PrimaryKeyDef {
            name: name.into(),
            columns,
        });
        self
    }

    /// Adds a foreign key constraint.
    #[must_use]
    pub fn foreign_key(
        mut self,
        name: impl Into<String>,
        columns: Vec<String>,
        references_table: impl Into<String>,
        references_columns: Vec<String>,
    ) -> Self {
        self.foreign_keys.push(ForeignKeyDef {
            name: name.into(),
            columns,
            references_table: references_table.into(),
            references_columns,
        });
        self
    }

    /// Adds an index.
    #[must_use]
    pub fn index(mut self, name: impl Into<String>, columns: Vec<String>, unique: bool) -> Self {
        self.indices.push(IndexDef {
            name: name.into(),
            columns,
            unique,
        });
        self
    }

    /// Gets a column by case-insensitive name.
    #[must_use]
    pub fn get_column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Returns the primary key in effect for this table.
    ///
    /// An explicit declaration always wins. Otherwise, a table with
    /// auto-increment columns gets a key synthesized from them, named
    /// `PK_<table>`.
    #[must_use]
    pub fn effective_primary_key(&self) -> Option<PrimaryKeyDef> {
        if let Some(pk) = &self.primary_key {
            return Some(pk.clone());
        }
        let auto: Vec<String> = self
            .columns
            .iter()
            .filter(|c| c.auto_increment)
            .map(|c| c.name.clone())
            .collect();
        if auto.is_empty() {
            None
        } else {
            Some(PrimaryKeyDef {
                name: format!("PK_{}", self.name),
                columns: auto,
            })
        }
    }
}
