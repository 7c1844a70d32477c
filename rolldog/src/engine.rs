//! Execution engine seam.
//!
//! The router only emits SQL text; an external columnar engine executes it
//! and hands back result sets. Orchestration and tests run against this
//! trait. A missing rollup artifact surfaces here as an execution error,
//! never as a silent fallback to the scan path.

use std::fmt::Display;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("referenced artifact does not exist: \"{0}\"")]
    ArtifactMissing(String),

    #[error("query execution failed: {0}")]
    Execution(String),
}

/// A typed result cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(value) => write!(f, "{}", value),
            // Keep a trailing ".0" on whole floats so a float column stays
            // recognizably a float in delimited output.
            Value::Float(value) if value.fract() == 0.0 && value.is_finite() => {
                write!(f, "{:.1}", value)
            }
            Value::Float(value) => write!(f, "{}", value),
            Value::Text(value) => write!(f, "{}", value),
        }
    }
}

/// An ordered result set with named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Anything that can execute the SQL this crate emits.
pub trait ExecutionEngine {
    fn execute(&mut self, sql: &str) -> Result<ResultSet, Error>;
}
