//! Read an uploaded CSV into raw rows keyed by header name.

use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::Read;

use tally_core::Result;

use crate::types::RawRow;

/// Headers plus the data records worth parsing, in file order, each with
/// its zero-based record index. A record the csv reader could not decode is
/// kept as an `Err`. Records with every field empty are left out but keep
/// their index, so the rows after them are numbered as in the file.
#[derive(Debug, Clone, Default)]
pub struct CsvRows {
    pub headers: Vec<String>,
    pub rows: Vec<(usize, std::result::Result<RawRow, String>)>,
}

impl CsvRows {
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }
}

fn record_to_row(headers: &[String], record: &StringRecord) -> RawRow {
    let mut row = RawRow::new();
    for (header, value) in headers.iter().zip(record.iter()) {
        // first column wins when a header repeats
        row.entry(header.clone()).or_insert_with(|| value.to_string());
    }
    row
}

/// Read CSV text. Only an unreadable header line is an error.
pub fn read_csv_rows<R: Read>(reader: R) -> Result<CsvRows> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for (index, result) in rdr.records().enumerate() {
        match result {
            Ok(record) => {
                if record.iter().all(|f| f.is_empty()) {
                    continue; // ",,," filler line
                }
                rows.push((index, Ok(record_to_row(&headers, &record))));
            }
            Err(e) => rows.push((index, Err(e.to_string()))),
        }
    }

    Ok(CsvRows { headers, rows })
}
