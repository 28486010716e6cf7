pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod ingestion;
pub mod observability;
pub mod presets;
pub mod query;
pub mod result;
pub mod stats;

pub use config::SandboxConfig;
pub use engine::Database;
pub use error::{Result, SandboxError};
pub use ingestion::{CsvDialect, CsvImporter, ImportSpec, ImportSummary};
pub use query::QueryExecutor;
pub use result::{Scalar, TabularResult};
pub use stats::{StatsAggregator, StatsSummary};
