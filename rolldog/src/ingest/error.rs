use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no events_part_*.csv chunks found in \"{0}\"")]
    NoChunks(PathBuf),

    #[error("\"{0}\": {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("{0}")]
    Sql(#[from] crate::sql::Error),
}
