//! Descriptor validation errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("select list is empty")]
    EmptySelect,

    #[error("\"{0}\" takes a column argument, not the wildcard")]
    WildcardArgument(&'static str),

    #[error("unknown aggregate function \"{0}\"")]
    UnknownFunction(String),

    #[error("aggregate must carry exactly one function tag")]
    MalformedAggregate,

    #[error("unknown filter operator \"{0}\"")]
    UnknownOperator(String),

    #[error("\"between\" on \"{0}\" takes exactly two bounds")]
    MalformedRange(String),

    #[error("\"eq\" on \"{0}\" takes a single value")]
    MalformedEquality(String),

    #[error("unknown order direction \"{0}\"")]
    UnknownDirection(String),
}
