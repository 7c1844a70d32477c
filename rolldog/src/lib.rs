//! Rolldog routes a fixed benchmark of analytical queries to pre-aggregated
//! rollup tables when a rewrite rule matches, and assembles an equivalent
//! scan over the partitioned events dataset when none does. It also emits
//! the ingestion script that builds the store the router depends on.

pub mod assembler;
pub mod catalog;
pub mod cli;
pub mod csv;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod logger;
pub mod router;
pub mod runner;
pub mod sql;
pub mod verify;

pub use error::Error;
