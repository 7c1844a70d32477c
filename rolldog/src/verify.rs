//! Result verification.
//!
//! Compares the candidate result directory against a trusted baseline,
//! one `q*.csv` file at a time. Rows compare as an unordered multiset;
//! anything that parses as a float is rounded to six decimal places first,
//! so aggregation order doesn't fail the comparison.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{error, info};

use crate::csv::CsvFile;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no baseline q*.csv files found in \"{0}\"")]
    NoBaseline(PathBuf),

    #[error("\"{0}\": {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("\"{0}\": {1}")]
    Csv(PathBuf, #[source] crate::csv::Error),
}

/// Result of comparing one query's output.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Match { rows: usize },
    MissingCandidate,
    HeaderMismatch { baseline: Vec<String>, candidate: Vec<String> },
    RowCountMismatch { baseline: usize, candidate: usize },
    DataMismatch { only_in_baseline: usize, only_in_candidate: usize },
}

impl Outcome {
    pub fn passed(&self) -> bool {
        matches!(self, Outcome::Match { .. })
    }
}

#[derive(Debug, Clone)]
pub struct Comparison {
    pub query: String,
    pub outcome: Outcome,
}

/// Comparison results for every baseline file.
#[derive(Debug, Clone)]
pub struct Report {
    comparisons: Vec<Comparison>,
}

impl Report {
    pub fn comparisons(&self) -> &[Comparison] {
        &self.comparisons
    }

    pub fn all_match(&self) -> bool {
        self.comparisons.iter().all(|c| c.outcome.passed())
    }
}

/// Compare every baseline result file against its candidate counterpart.
pub fn compare_dirs(baseline_dir: &Path, candidate_dir: &Path) -> Result<Report, Error> {
    let mut baseline_files = result_files(baseline_dir)?;
    if baseline_files.is_empty() {
        return Err(Error::NoBaseline(baseline_dir.to_owned()));
    }
    baseline_files.sort();

    let mut comparisons = Vec::with_capacity(baseline_files.len());
    for baseline_file in baseline_files {
        let query = baseline_file
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_owned();
        let candidate_file = candidate_dir.join(
            baseline_file
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_default(),
        );

        let outcome = compare_files(&baseline_file, &candidate_file)?;
        match &outcome {
            Outcome::Match { rows } => info!(query = %query, rows, "results match"),
            other => error!(query = %query, outcome = ?other, "results differ"),
        }
        comparisons.push(Comparison { query, outcome });
    }

    Ok(Report { comparisons })
}

fn compare_files(baseline: &Path, candidate: &Path) -> Result<Outcome, Error> {
    if !candidate.exists() {
        return Ok(Outcome::MissingCandidate);
    }

    let baseline_csv =
        CsvFile::read(baseline).map_err(|err| Error::Csv(baseline.to_owned(), err))?;
    let candidate_csv =
        CsvFile::read(candidate).map_err(|err| Error::Csv(candidate.to_owned(), err))?;

    if baseline_csv.headers != candidate_csv.headers {
        return Ok(Outcome::HeaderMismatch {
            baseline: baseline_csv.headers,
            candidate: candidate_csv.headers,
        });
    }

    if baseline_csv.rows.len() != candidate_csv.rows.len() {
        return Ok(Outcome::RowCountMismatch {
            baseline: baseline_csv.rows.len(),
            candidate: candidate_csv.rows.len(),
        });
    }

    // Signed multiset: baseline rows count up, candidate rows count down.
    let mut counts: HashMap<Vec<String>, i64> = HashMap::new();
    for row in &baseline_csv.rows {
        *counts.entry(normalize_row(row)).or_default() += 1;
    }
    for row in &candidate_csv.rows {
        *counts.entry(normalize_row(row)).or_default() -= 1;
    }

    let only_in_baseline: i64 = counts.values().filter(|n| **n > 0).sum();
    let only_in_candidate: i64 = -counts.values().filter(|n| **n < 0).sum::<i64>();

    if only_in_baseline > 0 || only_in_candidate > 0 {
        return Ok(Outcome::DataMismatch {
            only_in_baseline: only_in_baseline as usize,
            only_in_candidate: only_in_candidate as usize,
        });
    }

    Ok(Outcome::Match {
        rows: baseline_csv.rows.len(),
    })
}

fn result_files(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let entries = fs::read_dir(dir).map_err(|err| Error::Io(dir.to_owned(), err))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| Error::Io(dir.to_owned(), err))?;
        let path = entry.path();
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with('q') && name.ends_with(".csv"))
            .unwrap_or(false);
        if matches {
            files.push(path);
        }
    }

    Ok(files)
}

fn normalize_row(row: &[String]) -> Vec<String> {
    row.iter().map(|value| normalize_value(value)).collect()
}

/// Round anything float-like to six decimal places; leave text alone.
fn normalize_value(value: &str) -> String {
    match value.trim().parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => format!("{:.6}", parsed),
        _ => value.to_owned(),
    }
}

#[cfg(test)]
mod test {
    use std::fs::File;
    use std::io::Write;

    use super::*;

    fn write_file(dir: &Path, name: &str, contents: &str) {
        let mut file = File::create(dir.join(name)).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn test_identical_dirs_match() {
        let baseline = tempfile::tempdir().unwrap();
        let candidate = tempfile::tempdir().unwrap();
        let contents = "day,sum(bid_price)\n2024-06-01,125.5\n";
        write_file(baseline.path(), "q1.csv", contents);
        write_file(candidate.path(), "q1.csv", contents);

        let report = compare_dirs(baseline.path(), candidate.path()).unwrap();
        assert!(report.all_match());
        assert_eq!(report.comparisons().len(), 1);
    }

    #[test]
    fn test_row_order_is_irrelevant() {
        let baseline = tempfile::tempdir().unwrap();
        let candidate = tempfile::tempdir().unwrap();
        write_file(baseline.path(), "q1.csv", "c,n\nJP,1\nUS,2\n");
        write_file(candidate.path(), "q1.csv", "c,n\nUS,2\nJP,1\n");

        let report = compare_dirs(baseline.path(), candidate.path()).unwrap();
        assert!(report.all_match());
    }

    #[test]
    fn test_float_noise_within_tolerance() {
        let baseline = tempfile::tempdir().unwrap();
        let candidate = tempfile::tempdir().unwrap();
        write_file(baseline.path(), "q1.csv", "c,n\nJP,0.1000000001\n");
        write_file(candidate.path(), "q1.csv", "c,n\nJP,0.1\n");

        let report = compare_dirs(baseline.path(), candidate.path()).unwrap();
        assert!(report.all_match());
    }

    #[test]
    fn test_float_drift_beyond_tolerance_fails() {
        let baseline = tempfile::tempdir().unwrap();
        let candidate = tempfile::tempdir().unwrap();
        write_file(baseline.path(), "q1.csv", "c,n\nJP,0.100001\n");
        write_file(candidate.path(), "q1.csv", "c,n\nJP,0.1\n");

        let report = compare_dirs(baseline.path(), candidate.path()).unwrap();
        assert!(!report.all_match());
    }

    #[test]
    fn test_integer_and_float_forms_compare_equal() {
        let baseline = tempfile::tempdir().unwrap();
        let candidate = tempfile::tempdir().unwrap();
        write_file(baseline.path(), "q1.csv", "c,n\nJP,100\n");
        write_file(candidate.path(), "q1.csv", "c,n\nJP,100.0\n");

        let report = compare_dirs(baseline.path(), candidate.path()).unwrap();
        assert!(report.all_match());
    }

    #[test]
    fn test_missing_candidate_file() {
        let baseline = tempfile::tempdir().unwrap();
        let candidate = tempfile::tempdir().unwrap();
        write_file(baseline.path(), "q1.csv", "c,n\nJP,1\n");

        let report = compare_dirs(baseline.path(), candidate.path()).unwrap();
        assert!(!report.all_match());
        assert_eq!(
            report.comparisons()[0].outcome,
            Outcome::MissingCandidate
        );
    }

    #[test]
    fn test_header_mismatch() {
        let baseline = tempfile::tempdir().unwrap();
        let candidate = tempfile::tempdir().unwrap();
        write_file(baseline.path(), "q1.csv", "c,sum(bid_price)\nJP,1\n");
        write_file(candidate.path(), "q1.csv", "c,total\nJP,1\n");

        let report = compare_dirs(baseline.path(), candidate.path()).unwrap();
        assert!(matches!(
            report.comparisons()[0].outcome,
            Outcome::HeaderMismatch { .. }
        ));
    }

    #[test]
    fn test_data_mismatch_counts() {
        let baseline = tempfile::tempdir().unwrap();
        let candidate = tempfile::tempdir().unwrap();
        write_file(baseline.path(), "q1.csv", "c,n\nJP,1\nUS,2\n");
        write_file(candidate.path(), "q1.csv", "c,n\nJP,1\nDE,3\n");

        let report = compare_dirs(baseline.path(), candidate.path()).unwrap();
        assert_eq!(
            report.comparisons()[0].outcome,
            Outcome::DataMismatch {
                only_in_baseline: 1,
                only_in_candidate: 1
            }
        );
    }

    #[test]
    fn test_empty_baseline_dir_is_an_error() {
        let baseline = tempfile::tempdir().unwrap();
        let candidate = tempfile::tempdir().unwrap();

        assert!(matches!(
            compare_dirs(baseline.path(), candidate.path()),
            Err(Error::NoBaseline(_))
        ));
    }

    #[test]
    fn test_text_values_not_normalized() {
        assert_eq!(normalize_value("2024-06-01"), "2024-06-01");
        assert_eq!(normalize_value("2024-06-01 00:01"), "2024-06-01 00:01");
        assert_eq!(normalize_value("1.5"), "1.500000");
    }
}
