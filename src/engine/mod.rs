//! Embedded Engine - the single owner of the in-process SQLite connection
//!
//! Every component reaches the engine through a [`Database`] handle passed to
//! it explicitly. The connection sits behind a mutex that is held for the
//! whole of each call, so at most one statement runs against the engine at a
//! time no matter how many threads or tasks share the handle.

pub mod seed;

use crate::error::{Result, SandboxError};
use crate::result::Scalar;
use itertools::Itertools;
use rusqlite::types::ValueRef;
use rusqlite::{params, Batch, Connection};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// One projection produced by a statement, exactly as the engine returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResultSet {
    pub column_names: Vec<String>,
    pub rows: Vec<Vec<Scalar>>,
}

/// Column of a user table as reported by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableColumn {
    pub name: String,
    pub declared_type: String,
}

/// A user table with its columns and current row count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<TableColumn>,
    pub row_count: i64,
}

/// Handle to the embedded engine.
pub struct Database {
    /// `None` until [`Database::initialize`] runs, and again after [`Database::close`].
    conn: Mutex<Option<Connection>>,

    /// Bumped every time an import replaces a table
    schema_version: AtomicU64,
}

impl Database {
    /// A handle with no engine behind it yet.
    pub fn uninitialized() -> Self {
        Self {
            conn: Mutex::new(None),
            schema_version: AtomicU64::new(0),
        }
    }

    /// Create a handle and start the engine, optionally loading the sample dataset.
    pub fn open(seed: bool) -> Result<Self> {
        let db = Self::uninitialized();
        db.initialize(seed)?;
        Ok(db)
    }

    /// Start the engine. A second call on a running engine does nothing.
    pub fn initialize(&self, seed: bool) -> Result<()> {
        let mut guard = self.lock()?;
        if guard.is_some() {
            debug!("Engine already initialized, ignoring");
            return Ok(());
        }

        let conn = Connection::open_in_memory()?;
        if seed {
            conn.execute_batch(seed::SEED_SCRIPT)?;
            info!(tables = ?seed::SEED_TABLES, "Loaded sample dataset");
        }

        *guard = Some(conn);
        info!(seeded = seed, "Embedded engine ready");
        Ok(())
    }

    /// Whether the engine is running. A poisoned lock is an error, not `false`.
    pub fn is_initialized(&self) -> Result<bool> {
        Ok(self.lock()?.is_some())
    }

    /// Shut the engine down. Later calls fail with `NotInitialized`.
    pub fn close(&self) -> Result<()> {
        let mut guard = self.lock()?;
        if let Some(conn) = guard.take() {
            conn.close().map_err(|(_, e)| SandboxError::from(e))?;
            info!("Embedded engine closed");
        }
        Ok(())
    }

    /// Run `f` with exclusive access to the connection.
    pub fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or(SandboxError::NotInitialized)?;
        f(conn)
    }

    /// Run a script of one or more statements and collect every projection.
    ///
    /// Statements that project no columns (DDL, most DML) contribute nothing,
    /// so a pure mutation script yields an empty list. A projection with zero
    /// rows still yields a result set. Statements that ran before a failing
    /// one stay applied.
    pub fn exec(&self, sql: &str) -> Result<Vec<RawResultSet>> {
        self.with_connection(|conn| run_script(conn, sql))
    }

    /// Run several scripts in order under a single lock acquisition.
    pub fn exec_batch(&self, scripts: &[&str]) -> Result<()> {
        self.with_connection(|conn| {
            for script in scripts {
                run_script(conn, script)?;
            }
            Ok(())
        })
    }

    /// Names of all user tables, sorted.
    pub fn list_tables(&self) -> Result<Vec<String>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
                 ORDER BY name",
            )?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(names)
        })
    }

    /// Columns of one table in declaration order.
    pub fn describe_table(&self, table: &str) -> Result<Vec<TableColumn>> {
        self.with_connection(|conn| describe(conn, table))
    }

    /// Every user table with its columns and row count.
    pub fn tables(&self) -> Result<Vec<TableInfo>> {
        let names = self.list_tables()?;
        self.with_connection(|conn| {
            names
                .into_iter()
                .map(|name| -> Result<TableInfo> {
                    let columns = describe(conn, &name)?;
                    let row_count = conn.query_row(
                        &format!("SELECT COUNT(*) FROM {}", quote_identifier(&name)),
                        [],
                        |row| row.get::<_, i64>(0),
                    )?;
                    Ok(TableInfo { name, columns, row_count })
                })
                .collect()
        })
    }

    pub fn schema_version(&self) -> u64 {
        self.schema_version.load(Ordering::SeqCst)
    }

    /// Record a schema change and return the new version.
    pub(crate) fn bump_schema_version(&self) -> u64 {
        self.schema_version.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<Connection>>> {
        self.conn
            .lock()
            .map_err(|_| SandboxError::Execution("database lock poisoned".to_string()))
    }
}

fn run_script(conn: &Connection, sql: &str) -> Result<Vec<RawResultSet>> {
    let mut sets = Vec::new();
    let mut batch = Batch::new(conn, sql);

    while let Some(mut stmt) = batch.next()? {
        let column_names: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        let width = column_names.len();

        let mut collected = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(width);
            for idx in 0..width {
                cells.push(to_scalar(row.get_ref(idx)?));
            }
            collected.push(cells);
        }

        if width > 0 {
            sets.push(RawResultSet {
                column_names,
                rows: collected,
            });
        }
    }

    debug!(result_sets = sets.len(), "Script executed");
    Ok(sets)
}

fn describe(conn: &Connection, table: &str) -> Result<Vec<TableColumn>> {
    let mut stmt = conn.prepare("SELECT name, type FROM pragma_table_info(?1)")?;
    let columns = stmt
        .query_map(params![table], |row| {
            Ok(TableColumn {
                name: row.get(0)?,
                declared_type: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    if columns.is_empty() {
        return Err(SandboxError::Execution(format!("no such table: {}", table)));
    }
    Ok(columns)
}

/// Decide the scalar variant of an engine value.
fn to_scalar(value: ValueRef<'_>) -> Scalar {
    match value {
        ValueRef::Null => Scalar::Null,
        ValueRef::Integer(i) => Scalar::Number(i as f64),
        ValueRef::Real(f) => Scalar::Number(f),
        ValueRef::Text(bytes) => Scalar::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => {
            Scalar::Text(format!("X'{}'", bytes.iter().map(|b| format!("{:02X}", b)).join("")))
        }
    }
}

/// Wrap an identifier in double quotes, doubling any embedded quote.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
