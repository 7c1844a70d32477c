//! SQL rendering errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("\"{0}\" is not a valid column identifier")]
    InvalidIdentifier(String),
}
