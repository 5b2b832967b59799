//! Table identifiers and SQL identifier quoting.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DbError, Result};

/// Schema used when an identifier carries no explicit schema.
pub const DEFAULT_SCHEMA: &str = "public";

/// A possibly schema-qualified table name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: String,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Parse `schema.table` or `table` (schema defaults to `public`).
    ///
    /// Only the first dot separates schema from table.
    pub fn parse(identifier: &str) -> Result<Self> {
        let identifier = identifier.trim();
        let (schema, name) = match identifier.split_once('.') {
            Some((schema, name)) => (schema.trim(), name.trim()),
            None => (DEFAULT_SCHEMA, identifier),
        };

        if schema.is_empty() || name.is_empty() {
            return Err(DbError::invalid_input(format!(
                "Invalid table identifier: '{}'",
                identifier
            )));
        }

        Ok(Self::new(schema, name))
    }

    /// Quoted `"schema"."table"` form for SQL text.
    pub fn quoted(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.name))
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// Double-quote an identifier, escaping embedded quotes.
pub fn quote_ident(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len() + 2);
    escaped.push('"');
    for ch in name.chars() {
        if ch == '"' {
            escaped.push('"');
        }
        escaped.push(ch);
    }
    escaped.push('"');
    escaped
}
