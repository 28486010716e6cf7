//! Ingestion Module - CSV files into engine tables
//!
//! An import parses the file, sanitizes the header into column names,
//! builds an all-TEXT schema and replaces the target table with the file's
//! rows:
//! - `DROP TABLE IF EXISTS` + `CREATE TABLE`
//! - one multi-row `INSERT`
//!
//! Both scripts run under a single engine lock. A failed `INSERT` leaves the
//! freshly created, empty table in place.

pub mod csv_parser;
pub mod identifiers;
pub mod table_builder;

pub use csv_parser::{CsvDialect, ParsedCsv};
pub use identifiers::{default_table_name, is_sanitized, sanitize_identifier};
pub use table_builder::{ColumnDescriptor, InferredSchema, StorageType};

use crate::engine::Database;
use crate::error::{Result, SandboxError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// One file to import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSpec {
    pub source_file_name: String,

    /// Target table. Sanitized again at import time.
    pub table_name: String,

    pub delimiter: char,

    pub raw_content: String,

    #[serde(default)]
    pub dialect: CsvDialect,
}

impl ImportSpec {
    /// Table named after the file, comma-delimited, simple parsing.
    pub fn new(source_file_name: impl Into<String>, raw_content: impl Into<String>) -> Self {
        let source_file_name = source_file_name.into();
        Self {
            table_name: default_table_name(&source_file_name),
            source_file_name,
            delimiter: ',',
            raw_content: raw_content.into(),
            dialect: CsvDialect::Simple,
        }
    }

    /// Read a file from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Ok(Self::new(file_name, content))
    }

    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_dialect(mut self, dialect: CsvDialect) -> Self {
        self.dialect = dialect;
        self
    }
}

/// Outcome of a successful import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub table_name: String,
    pub row_count: usize,
    pub columns: Vec<String>,

    /// Schema version after the import; views showing schema-dependent data
    /// should refresh when it changes.
    pub schema_version: u64,
}

/// Imports CSV content into a [`Database`].
pub struct CsvImporter<'a> {
    db: &'a Database,
}

impl<'a> CsvImporter<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Import `contents` into `table_name` with the simple dialect.
    pub fn import_csv(
        &self,
        contents: &str,
        table_name: &str,
        delimiter: char,
    ) -> Result<ImportSummary> {
        self.run(table_name, contents, delimiter, CsvDialect::Simple)
    }

    /// Import a prepared `ImportSpec`, consuming it.
    pub fn import(&self, spec: ImportSpec) -> Result<ImportSummary> {
        info!(
            file = %spec.source_file_name,
            table = %spec.table_name,
            dialect = ?spec.dialect,
            "Importing CSV"
        );
        self.run(&spec.table_name, &spec.raw_content, spec.delimiter, spec.dialect)
    }

    fn run(
        &self,
        table_name: &str,
        contents: &str,
        delimiter: char,
        dialect: CsvDialect,
    ) -> Result<ImportSummary> {
        if !self.db.is_initialized()? {
            return Err(SandboxError::NotInitialized);
        }

        let table = sanitize_identifier(table_name.trim());
        if !is_sanitized(&table) {
            return Err(SandboxError::InvalidTableName(table_name.to_string()));
        }

        let parsed = csv_parser::parse(contents, delimiter, dialect)?;
        let schema = InferredSchema::infer(&table, &parsed.headers);
        if schema.columns.is_empty() || parsed.rows.is_empty() {
            return Err(SandboxError::NoValidData);
        }

        let ddl = schema.create_table_sql();
        let dml = schema.insert_sql(&parsed.rows);
        self.db.exec_batch(&[ddl.as_str(), dml.as_str()]).map_err(|e| match e {
            SandboxError::NotInitialized => SandboxError::NotInitialized,
            SandboxError::Execution(msg) => {
                warn!(table = %table, error = %msg, "Import failed");
                SandboxError::Import(msg)
            }
            other => SandboxError::Import(other.to_string()),
        })?;

        let schema_version = self.db.bump_schema_version();
        info!(
            table = %table,
            rows = parsed.rows.len(),
            columns = schema.columns.len(),
            schema_version,
            "Imported CSV"
        );

        Ok(ImportSummary {
            table_name: table,
            row_count: parsed.rows.len(),
            columns: schema.column_names(),
            schema_version,
        })
    }
}
