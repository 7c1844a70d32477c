//! CSV result files.
//!
//! Query results and verification baselines are small header-plus-rows CSV
//! files, read whole. Quoted fields with doubled quotes are handled by the
//! parser; the writer quotes only when a field needs it.

use std::fs;
use std::path::Path;

use csv_core::{ReadRecordResult, Reader};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("\"{0}\": {1}")]
    Io(std::path::PathBuf, #[source] std::io::Error),

    #[error("file contains no records")]
    Empty,

    #[error("record is not valid utf-8")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("record larger than its file")]
    RecordOverflow,
}

/// A parsed CSV file: one header record plus data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvFile {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvFile {
    pub fn read(path: &Path) -> Result<Self, Error> {
        let data = fs::read(path).map_err(|err| Error::Io(path.to_owned(), err))?;
        Self::parse(&data)
    }

    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        let mut input = data.to_vec();
        // A trailing terminator means every record surfaces as Record
        // before End; no partial-record flush to resume.
        if !input.ends_with(b"\n") {
            input.push(b'\n');
        }

        // Sized so one record can never overflow them.
        let mut output = vec![0u8; input.len() + 1];
        let mut ends = vec![0usize; input.len() + 1];

        let mut reader = Reader::new();
        let mut records: Vec<Vec<String>> = Vec::new();
        let mut pos = 0;

        loop {
            let (result, read, _written, fields) =
                reader.read_record(&input[pos..], &mut output, &mut ends);
            pos += read;

            match result {
                ReadRecordResult::Record => {
                    let mut row = Vec::with_capacity(fields);
                    let mut start = 0;
                    for &end in &ends[..fields] {
                        row.push(std::str::from_utf8(&output[start..end])?.to_owned());
                        start = end;
                    }
                    records.push(row);
                }
                ReadRecordResult::End => break,
                ReadRecordResult::InputEmpty => continue,
                ReadRecordResult::OutputFull | ReadRecordResult::OutputEndsFull => {
                    return Err(Error::RecordOverflow);
                }
            }
        }

        if records.is_empty() {
            return Err(Error::Empty);
        }

        let headers = records.remove(0);
        Ok(Self {
            headers,
            rows: records,
        })
    }
}

/// Render one record with minimal quoting.
pub fn format_record(fields: &[String]) -> String {
    let mut record = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            record.push(',');
        }
        if field.contains([',', '"', '\n', '\r']) {
            record.push('"');
            record.push_str(&field.replace('"', "\"\""));
            record.push('"');
        } else {
            record.push_str(field);
        }
    }
    record.push('\n');
    record
}
