//! Query runner.
//!
//! Routes each descriptor through the rewrite rules, falls back to the
//! partitioned scan when nothing matches, executes the chosen statement
//! and writes one result file per query. An execution failure is fatal:
//! a rewritten query whose rollup is missing must never silently degrade
//! to the scan path, since that would mask a broken data store.

use std::fs;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use rolldog_config::General;
use tracing::{debug, info};

use crate::assembler::Assembler;
use crate::csv::format_record;
use crate::descriptor::QueryDescriptor;
use crate::engine::{ExecutionEngine, ResultSet};
use crate::router::Router;
use crate::Error;

/// How a query was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedBy {
    /// Rewritten against a rollup; carries the matching rule's name.
    Rollup(&'static str),
    /// Fallback scan over the partitioned events dataset.
    Scan,
}

/// Per-query execution summary.
#[derive(Debug, Clone)]
pub struct QueryReport {
    pub query: usize,
    pub served_by: ServedBy,
    pub rows: usize,
    pub output: PathBuf,
}

pub struct Runner {
    router: Router,
    assembler: Assembler,
    output_dir: PathBuf,
}

impl Runner {
    pub fn new(general: &General, router: Router) -> Self {
        Self {
            router,
            assembler: Assembler::new(general),
            output_dir: general.output_dir.clone(),
        }
    }

    /// Execute every descriptor in order, writing `q1.csv`, `q2.csv`, ...
    /// into the output directory.
    pub fn run(
        &self,
        engine: &mut dyn ExecutionEngine,
        queries: &[QueryDescriptor],
    ) -> Result<Vec<QueryReport>, Error> {
        fs::create_dir_all(&self.output_dir)
            .map_err(|err| Error::Io(self.output_dir.clone(), err))?;

        let mut reports = Vec::with_capacity(queries.len());
        for (number, query) in queries.iter().enumerate() {
            let number = number + 1;
            let (sql, served_by) = self.plan(query)?;
            info!(query = number, served_by = ?served_by, "executing");
            debug!(query = number, sql = %sql);

            let results = engine.execute(&sql)?;
            let output = self.output_dir.join(format!("q{}.csv", number));
            write_results(&output, &results)?;

            reports.push(QueryReport {
                query: number,
                served_by,
                rows: results.rows.len(),
                output,
            });
        }

        Ok(reports)
    }

    /// Pick the statement for one descriptor: first matching rewrite rule,
    /// otherwise the full scan.
    pub fn plan(&self, query: &QueryDescriptor) -> Result<(String, ServedBy), Error> {
        match self.router.route(query) {
            Some(rewritten) => Ok((rewritten.sql()?, ServedBy::Rollup(rewritten.rule()))),
            None => Ok((self.assembler.assemble(query).render()?, ServedBy::Scan)),
        }
    }
}

fn write_results(path: &Path, results: &ResultSet) -> Result<(), Error> {
    let mut file = File::create(path).map_err(|err| Error::Io(path.to_owned(), err))?;

    let mut contents = format_record(&results.columns);
    for row in &results.rows {
        let fields: Vec<String> = row.iter().map(|value| value.to_string()).collect();
        contents.push_str(&format_record(&fields));
    }

    file.write_all(contents.as_bytes())
        .map_err(|err| Error::Io(path.to_owned(), err))?;
    Ok(())
}
