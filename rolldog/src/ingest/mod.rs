//! Ingestion script builder.
//!
//! Turns a directory of raw `events_part_*.csv` chunks into the SQL script
//! that builds the optimized store: a typed events table, a parquet export
//! partitioned by event type and day, and one pre-aggregation per catalog
//! entry. Rollup definitions are derived from the catalog, so the artifacts
//! the script materializes always match what the router rewrites against.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use rolldog_config::General;
use tracing::{info, warn};

use crate::catalog::{Catalog, MeasureSource, Rollup};
use crate::descriptor::{AggregateFunction, Filter, Predicate, Scalar};
use crate::sql::{escape_text, Expr, Relation, SelectStatement};

pub mod error;

pub use error::Error;

/// Derived time columns are computed once at ingest so queries never parse
/// timestamps. `minute` is a VARCHAR key, not a timestamp.
const CREATE_EVENTS: &str = "CREATE TABLE events (\
 ts TIMESTAMP,\
 week TIMESTAMP,\
 day DATE,\
 hour TIMESTAMP,\
 minute VARCHAR,\
 type VARCHAR,\
 auction_id VARCHAR,\
 advertiser_id INTEGER,\
 publisher_id INTEGER,\
 bid_price DOUBLE,\
 user_id BIGINT,\
 total_price DOUBLE,\
 country VARCHAR\
)";

/// An ordered SQL script for the execution engine.
#[derive(Debug, Clone)]
pub struct IngestScript {
    generated_at: String,
    statements: Vec<String>,
}

impl IngestScript {
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// Render the script as executable SQL text.
    pub fn render(&self) -> String {
        let mut script = format!("-- ingestion script, generated {}\n\n", self.generated_at);
        for statement in &self.statements {
            script.push_str(statement);
            script.push_str(";\n\n");
        }
        script
    }
}

/// Builds the ingestion script for one raw data directory.
pub struct ScriptBuilder<'a> {
    general: &'a General,
    catalog: &'a Catalog,
}

impl<'a> ScriptBuilder<'a> {
    pub fn new(general: &'a General, catalog: &'a Catalog) -> Self {
        Self { general, catalog }
    }

    pub fn build(&self, data_dir: &Path) -> Result<IngestScript, Error> {
        let chunks = discover_chunks(data_dir)?;
        info!(chunks = chunks.len(), "building ingestion script");

        let mut statements = vec![CREATE_EVENTS.to_owned()];
        for chunk in &chunks {
            statements.push(load_chunk(chunk));
        }
        statements.push(self.export_events());
        for rollup in self.catalog.iter() {
            statements.push(self.build_rollup(rollup)?);
        }

        Ok(IngestScript {
            generated_at: Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            statements,
        })
    }

    /// One partitioned export for the whole table; partition pruning on
    /// `type` and `day` is what makes the fallback scan tolerable.
    fn export_events(&self) -> String {
        format!(
            "COPY events TO '{}' (\
             FORMAT PARQUET,\
             PARTITION_BY (type, day),\
             OVERWRITE_OR_IGNORE true,\
             COMPRESSION 'ZSTD')",
            escape_text(&self.general.events_path().display().to_string())
        )
    }

    fn build_rollup(&self, rollup: &Rollup) -> Result<String, Error> {
        let mut statement = SelectStatement::new(Relation::Partitioned {
            path: self.general.events_path(),
        });

        for column in rollup.grain() {
            statement = statement.column(column).group_by(column);
        }

        for measure in rollup.measures() {
            let expr = match measure.source {
                MeasureSource::Sum(column) => Expr::Aggregate {
                    function: AggregateFunction::Sum,
                    argument: Some(column.to_owned()),
                },
                MeasureSource::Count(column) => Expr::Aggregate {
                    function: AggregateFunction::Count,
                    argument: column.map(|column| column.to_owned()),
                },
            };
            statement = statement.item(expr, Some(measure.name));
        }

        if let Some(event_type) = rollup.event_type() {
            statement = statement.filter(Filter::new(
                "type".into(),
                Predicate::Eq(Scalar::Text(event_type.into())),
            ));
        }

        Ok(format!(
            "COPY ({}) TO '{}' (FORMAT PARQUET)",
            statement.render()?,
            escape_text(&rollup.path().display().to_string())
        ))
    }
}

/// Raw chunks in lexicographic order. Empty files are skipped with a
/// warning; a directory with no usable chunks is an error.
fn discover_chunks(data_dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let entries = fs::read_dir(data_dir).map_err(|err| Error::Io(data_dir.to_owned(), err))?;

    let mut chunks = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| Error::Io(data_dir.to_owned(), err))?;
        let path = entry.path();

        let chunk = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with("events_part_") && name.ends_with(".csv"))
            .unwrap_or(false);
        if !chunk {
            continue;
        }

        let metadata = fs::metadata(&path).map_err(|err| Error::Io(path.clone(), err))?;
        if metadata.len() == 0 {
            warn!(chunk = %path.display(), "skipping empty chunk");
            continue;
        }

        chunks.push(path);
    }

    if chunks.is_empty() {
        return Err(Error::NoChunks(data_dir.to_owned()));
    }

    chunks.sort();
    Ok(chunks)
}

/// Load one chunk through the casting pipeline. Every field is read as text
/// first; malformed numerics and empty strings become NULL instead of
/// failing the load.
fn load_chunk(chunk: &Path) -> String {
    format!(
        "INSERT INTO events \
         WITH raw AS (\
         SELECT * FROM read_csv('{}', header = true, all_varchar = true)\
         ), casted AS (\
         SELECT \
         to_timestamp(TRY_CAST(ts AS DOUBLE) / 1000.0) AS ts, \
         type, \
         auction_id, \
         TRY_CAST(advertiser_id AS INTEGER) AS advertiser_id, \
         TRY_CAST(publisher_id AS INTEGER) AS publisher_id, \
         TRY_CAST(NULLIF(bid_price, '') AS DOUBLE) AS bid_price, \
         TRY_CAST(user_id AS BIGINT) AS user_id, \
         TRY_CAST(NULLIF(total_price, '') AS DOUBLE) AS total_price, \
         country \
         FROM raw\
         ) \
         SELECT \
         ts, \
         DATE_TRUNC('week', ts) AS week, \
         DATE(ts) AS day, \
         DATE_TRUNC('hour', ts) AS hour, \
         STRFTIME(ts, '%Y-%m-%d %H:%M') AS minute, \
         type, \
         auction_id, \
         advertiser_id, \
         publisher_id, \
         bid_price, \
         user_id, \
         total_price, \
         country \
         FROM casted",
        escape_text(&chunk.display().to_string())
    )
}
