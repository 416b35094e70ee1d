use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use tally_core::Transaction;

/// One uploaded row: source column name -> raw cell text
pub type RawRow = BTreeMap<String, String>;

/// Why a single row was left out of the analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "value", rename_all = "snake_case")]
pub enum RejectReason {
    MissingDate,
    InvalidDate(String),
    MissingAmount,
    InvalidAmount(String),
    /// The CSV record itself could not be read
    Malformed(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::MissingDate => write!(f, "missing date"),
            RejectReason::InvalidDate(v) => write!(f, "unrecognized date '{v}'"),
            RejectReason::MissingAmount => write!(f, "missing amount"),
            RejectReason::InvalidAmount(v) => write!(f, "unparseable amount '{v}'"),
            RejectReason::Malformed(e) => write!(f, "malformed record: {e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRow {
    /// Zero-based data record index (header excluded). Blank lines are not
    /// records; `,,` filler lines are and keep their number.
    pub row: usize,
    #[serde(flatten)]
    pub reason: RejectReason,
}

/// Normalized output of the statement parser
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedStatement {
    pub rows_read: usize,
    pub transactions: Vec<Transaction>,
    pub rejected: Vec<RejectedRow>,
    /// Rows whose net amount was zero; dropped as non-informative
    pub dropped_zero: usize,
}

impl ParsedStatement {
    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}
