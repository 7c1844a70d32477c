//! Configuration errors.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error on \"{0}\": {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("TOML parse error in \"{0}\": {1}")]
    Parse(PathBuf, #[source] Box<toml::de::Error>),
}
