use std::fs::read_to_string;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rolldog_config::Config;
use tracing::info;

use crate::catalog::Catalog;
use crate::descriptor::QueryDescriptor;
use crate::ingest::ScriptBuilder;
use crate::router::Router;
use crate::runner::{Runner, ServedBy};
use crate::verify;
use crate::Error;

/// Rolldog routes analytics queries to pre-aggregated rollup tables.
#[derive(Parser, Debug)]
#[command(name = "rolldog", version)]
pub struct Cli {
    /// Path to the configuration file. Default: "rolldog.toml"
    #[arg(short, long, default_value = "rolldog.toml")]
    pub config: PathBuf,
    /// Subcommand.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Route query descriptors and print the SQL each one would execute.
    Plan {
        /// Path to the JSON file containing the query descriptors.
        #[arg(short, long)]
        queries: PathBuf,
    },

    /// Emit the ingestion script that builds the optimized data store.
    Prepare {
        /// Directory containing the raw events_part_*.csv chunks.
        #[arg(short, long)]
        data_path: PathBuf,
    },

    /// Verify a candidate result directory against a baseline.
    Verify {
        /// Baseline output directory.
        #[arg(long, default_value = "out_baseline")]
        baseline: PathBuf,

        /// Candidate output directory.
        #[arg(long, default_value = "out")]
        candidate: PathBuf,
    },

    /// Check the configuration file for errors.
    Configcheck,
}

/// Print the routing decision and SQL for each descriptor in the file.
#[allow(clippy::print_stdout)]
pub fn plan(config: &Config, queries: &PathBuf) -> Result<(), Error> {
    let contents =
        read_to_string(queries).map_err(|err| Error::Io(queries.to_owned(), err))?;
    let queries: Vec<QueryDescriptor> = serde_json::from_str(&contents)?;

    let runner = Runner::new(
        &config.general,
        Router::new(Catalog::new(&config.general)),
    );

    for (number, query) in queries.iter().enumerate() {
        let (sql, served_by) = runner.plan(query)?;
        match served_by {
            ServedBy::Rollup(rule) => println!("-- q{}: rollup ({})", number + 1, rule),
            ServedBy::Scan => println!("-- q{}: full scan", number + 1),
        }
        println!("{};\n", sql);
    }

    Ok(())
}

/// Emit the ingestion script for a raw data directory.
#[allow(clippy::print_stdout)]
pub fn prepare(config: &Config, data_path: &PathBuf) -> Result<(), Error> {
    let catalog = Catalog::new(&config.general);
    let script = ScriptBuilder::new(&config.general, &catalog).build(data_path)?;
    println!("{}", script.render());
    Ok(())
}

/// Compare result directories; true when every query matches.
pub fn verify(baseline: &PathBuf, candidate: &PathBuf) -> Result<bool, Error> {
    let report = verify::compare_dirs(baseline, candidate)?;
    let passed = report
        .comparisons()
        .iter()
        .filter(|c| c.outcome.passed())
        .count();
    info!(
        passed,
        total = report.comparisons().len(),
        "verification complete"
    );
    Ok(report.all_match())
}

/// Confirm that the configuration file is valid.
pub fn config_check(config_path: &PathBuf) -> Result<(), Error> {
    Config::check(config_path)?;
    info!("configuration ok");
    Ok(())
}
