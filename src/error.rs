use thiserror::Error;

#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("Database not initialized")]
    NotInitialized,

    /// The engine rejected or failed a statement. Carries the engine's message verbatim.
    #[error("{0}")]
    Execution(String),

    #[error("No data found in the file")]
    EmptyInput,

    #[error("No valid data found in the file")]
    NoValidData,

    /// DDL/DML against the engine failed during an import.
    #[error("Import failed: {0}")]
    Import(String),

    #[error("Invalid table name: {0:?}")]
    InvalidTableName(String),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for SandboxError {
    fn from(err: rusqlite::Error) -> Self {
        SandboxError::Execution(engine_message(&err))
    }
}

impl From<csv::Error> for SandboxError {
    fn from(err: csv::Error) -> Self {
        SandboxError::Csv(err.to_string())
    }
}

/// Extracts the human-readable message SQLite attached to an error.
///
/// `rusqlite` prefixes some variants with its own wording; the sandbox shows
/// the engine's text, so the SQLite message is preferred when present.
pub fn engine_message(err: &rusqlite::Error) -> String {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(msg)) => msg.clone(),
        other => other.to_string(),
    }
}

pub type Result<T> = std::result::Result<T, SandboxError>;
