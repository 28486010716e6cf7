//! Table Builder - schema for an imported file and the SQL that materializes it

use crate::engine::quote_identifier;
use crate::ingestion::identifiers;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage class of an imported column. Imports keep every value as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageType {
    Text,
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageType::Text => write!(f, "TEXT"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub storage_type: StorageType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferredSchema {
    pub table_name: String,
    pub columns: Vec<ColumnDescriptor>,
}

impl InferredSchema {
    /// Build the schema from raw header cells. `table_name` must already be sanitized.
    pub fn infer(table_name: &str, raw_headers: &[String]) -> Self {
        let columns = identifiers::column_names(raw_headers)
            .into_iter()
            .map(|name| ColumnDescriptor {
                name,
                storage_type: StorageType::Text,
            })
            .collect();

        Self {
            table_name: table_name.to_string(),
            columns,
        }
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// `DROP TABLE IF EXISTS` followed by `CREATE TABLE`, as one script.
    pub fn create_table_sql(&self) -> String {
        let table = quote_identifier(&self.table_name);
        let columns = self
            .columns
            .iter()
            .map(|c| format!("  {} {}", quote_identifier(&c.name), c.storage_type))
            .join(",\n");

        format!(
            "DROP TABLE IF EXISTS {table};\nCREATE TABLE {table} (\n{columns}\n);",
            table = table,
            columns = columns
        )
    }

    /// One multi-row `INSERT` carrying every row. Rows must already be
    /// aligned to the column count.
    pub fn insert_sql(&self, rows: &[Vec<String>]) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| quote_identifier(&c.name))
            .join(", ");
        let values = rows
            .iter()
            .map(|row| format!("({})", row.iter().map(|v| quote_literal(v)).join(", ")))
            .join(",\n");

        format!(
            "INSERT INTO {} ({})\nVALUES {};",
            quote_identifier(&self.table_name),
            columns,
            values
        )
    }
}

/// Wrap a value in single quotes, doubling embedded single quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
