//! Minimal text accumulation for parameter-free DDL statements.
//!
//! Reconciliation only ever produces literal DDL, so this is a plain string
//! assembler, distinct from any parameterized query building.

/// Accumulates fragments of a single SQL statement.
#[derive(Debug, Default)]
pub struct SqlBuilder {
    sql: String,
}

impl SqlBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a fragment verbatim.
    pub fn append(&mut self, fragment: impl AsRef<str>) -> &mut Self {
        self.sql.push_str(fragment.as_ref());
        self
    }

    /// Appends fragments separated by `separator`.
    pub fn append_joined<I>(&mut self, fragments: I, separator: &str) -> &mut Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for (index, fragment) in fragments.into_iter().enumerate() {
            if index > 0 {
                self.sql.push_str(separator);
            }
            self.sql.push_str(fragment.as_ref());
        }
        self
    }

    /// Returns true if nothing has been appended yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    /// Consumes the builder and returns the statement text.
    #[must_use]
    pub fn build(self) -> String {
        self.sql
    }
}
