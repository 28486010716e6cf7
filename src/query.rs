//! Query Execution - submits statements to the engine and shapes the answer

use crate::engine::Database;
use crate::error::{Result, SandboxError};
use crate::result::TabularResult;
use chrono::Utc;
use std::time::Instant;
use tracing::{debug, warn};

/// Runs user statements against a [`Database`].
///
/// The statement text goes to the engine untouched: scripts with several
/// statements are the engine's business, and failures are reported once,
/// without retries.
pub struct QueryExecutor<'a> {
    db: &'a Database,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn execute(&self, query: &str) -> Result<TabularResult> {
        if !self.db.is_initialized()? {
            warn!("Query rejected: database not initialized");
            return Err(SandboxError::NotInitialized);
        }

        let started = Instant::now();
        let sets = match self.db.exec(query) {
            Ok(sets) => sets,
            Err(SandboxError::NotInitialized) => return Err(SandboxError::NotInitialized),
            Err(e) => {
                warn!(error = %e, "Query failed");
                return Err(SandboxError::Execution(execution_message(e)));
            }
        };

        let result = TabularResult::from_result_sets(query, Utc::now(), sets);
        debug!(
            rows = result.row_count(),
            columns = result.column_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Query executed"
        );
        Ok(result)
    }
}

fn execution_message(err: SandboxError) -> String {
    match err {
        SandboxError::Execution(msg) => msg,
        other => other.to_string(),
    }
}
