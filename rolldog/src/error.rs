//! Top-level errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("config: {0}")]
    Config(#[from] rolldog_config::Error),

    #[error("query descriptor: {0}")]
    Descriptor(#[from] crate::descriptor::Error),

    #[error("sql: {0}")]
    Sql(#[from] crate::sql::Error),

    #[error("ingest: {0}")]
    Ingest(#[from] crate::ingest::Error),

    #[error("engine: {0}")]
    Engine(#[from] crate::engine::Error),

    #[error("csv: {0}")]
    Csv(#[from] crate::csv::Error),

    #[error("verify: {0}")]
    Verify(#[from] crate::verify::Error),

    #[error("queries file is not valid: {0}")]
    Queries(#[from] serde_json::Error),

    #[error("\"{0}\": {1}")]
    Io(PathBuf, #[source] std::io::Error),
}
