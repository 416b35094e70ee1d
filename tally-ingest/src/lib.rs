//! tally-ingest: statement ingestion. Reads raw CSV rows into validated,
//! sign-normalized transactions and counts the rows it had to reject.

pub mod columns;
pub mod csv_source;
pub mod parsers;
pub mod statement;
pub mod types;

pub use columns::ResolvedColumns;
pub use csv_source::{read_csv_rows, CsvRows};
pub use statement::StatementParser;
pub use types::{ParsedStatement, RawRow, RejectReason, RejectedRow};
