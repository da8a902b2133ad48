use std::path::Path;

use csv::ReaderBuilder;

use crate::csv_processor::batcher::Row;
use crate::utils::Result;

/// Reads a delimited source file into rows keyed by column name.
///
/// When `names` is supplied the file is treated as header-less and the given
/// names label the fields positionally; otherwise the first record is the
/// header. `skip_rows` skips leading data records and `row_limit` caps how
/// many are read, for partial loads of large sources.
pub fn read_rows(
    path: &Path,
    names: Option<&[String]>,
    delimiter: u8,
    skip_rows: usize,
    row_limit: Option<usize>,
) -> Result<(Vec<String>, Vec<Row>)> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(names.is_none())
        .from_path(path)?;

    let columns: Vec<String> = match names {
        Some(names) => names.to_vec(),
        None => reader.headers()?.iter().map(str::to_string).collect(),
    };

    let limit = row_limit.unwrap_or(usize::MAX);
    let mut rows = Vec::new();

    for record in reader.records().skip(skip_rows).take(limit) {
        let record = record?;
        let row: Row = columns
            .iter()
            .zip(record.iter())
            .map(|(name, value)| (name.clone(), value.to_string()))
            .collect();
        rows.push(row);
    }

    Ok((columns, rows))
}

/// Reads a delimited file back as raw records with its header, preserving
/// record order. Used to re-load partial artifacts for the merge step.
pub fn read_records(path: &Path, delimiter: u8) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_path(path)?;

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        records.push(record.iter().map(str::to_string).collect());
    }

    Ok((columns, records))
}
