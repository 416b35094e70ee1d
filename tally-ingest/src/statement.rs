//! Statement parser: raw rows in, validated transactions out.
//!
//! Sign normalization, in order:
//! 1. Debit/credit columns: when either cell is filled and the net
//!    `|credit| - |debit|` is non-zero, that net is the amount.
//! 2. Otherwise the signed amount column, flipped for `outflow_positive`
//!    exports. A recognized direction flag (`DR`/`CR`, `Debit`/`Credit`)
//!    then forces the sign of that magnitude.
//! 3. Rows with no monetary cell at all are rejected; rows netting to zero
//!    are dropped.

use rust_decimal::Decimal;
use std::io::Read;
use tracing::debug;

use tally_core::{AmountSign, AnalysisConfig, ColumnMapping, Direction, Result, Transaction};

use crate::columns::ResolvedColumns;
use crate::csv_source::read_csv_rows;
use crate::parsers::{parse_amount, parse_date, parse_direction_flag};
use crate::types::{ParsedStatement, RawRow, RejectReason, RejectedRow};

enum RowOutcome {
    Parsed(Transaction),
    Rejected(RejectReason),
    ZeroAmount,
}

#[derive(Debug, Clone)]
pub struct StatementParser {
    mapping: ColumnMapping,
    date_formats: Vec<String>,
    amount_sign: AmountSign,
}

impl StatementParser {
    pub fn new(mapping: ColumnMapping, date_formats: Vec<String>, amount_sign: AmountSign) -> Self {
        Self {
            mapping,
            date_formats,
            amount_sign,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            config.columns.clone(),
            config.date_formats.clone(),
            config.amount_sign,
        )
    }

    pub fn resolve(&self, headers: &[String]) -> Result<ResolvedColumns> {
        ResolvedColumns::resolve(&self.mapping, headers)
    }

    /// Parse in-memory rows. Columns are resolved against every key seen,
    /// in first-seen order.
    pub fn parse_rows(&self, rows: &[RawRow]) -> Result<ParsedStatement> {
        if rows.is_empty() {
            return Ok(ParsedStatement::default());
        }

        let mut headers: Vec<String> = Vec::new();
        for row in rows {
            for key in row.keys() {
                if !headers.contains(key) {
                    headers.push(key.clone());
                }
            }
        }
        let cols = self.resolve(&headers)?;

        let mut out = ParsedStatement::default();
        for (id, row) in rows.iter().enumerate() {
            self.push_outcome(&mut out, id, self.parse_row(&cols, id, row));
        }
        finish(&out);
        Ok(out)
    }

    /// Parse CSV text. Fails only when the header line is unreadable or the
    /// required columns are missing.
    pub fn parse_csv<R: Read>(&self, reader: R) -> Result<ParsedStatement> {
        let csv = read_csv_rows(reader)?;
        if csv.is_empty() {
            return Ok(ParsedStatement::default());
        }
        let cols = self.resolve(&csv.headers)?;

        let mut out = ParsedStatement::default();
        for (id, row) in &csv.rows {
            let id = *id;
            let outcome = match row {
                Ok(row) => self.parse_row(&cols, id, row),
                Err(e) => RowOutcome::Rejected(RejectReason::Malformed(e.clone())),
            };
            self.push_outcome(&mut out, id, outcome);
        }
        finish(&out);
        Ok(out)
    }

    fn push_outcome(&self, out: &mut ParsedStatement, id: usize, outcome: RowOutcome) {
        out.rows_read += 1;
        match outcome {
            RowOutcome::Parsed(txn) => out.transactions.push(txn),
            RowOutcome::Rejected(reason) => {
                debug!("Rejected row {}: {}", id, reason);
                out.rejected.push(RejectedRow { row: id, reason });
            }
            RowOutcome::ZeroAmount => out.dropped_zero += 1,
        }
    }

    fn parse_row(&self, cols: &ResolvedColumns, id: usize, row: &RawRow) -> RowOutcome {
        let Some(date_raw) = cell(row, Some(&cols.date)) else {
            return RowOutcome::Rejected(RejectReason::MissingDate);
        };
        let Some(date) = parse_date(date_raw, &self.date_formats) else {
            return RowOutcome::Rejected(RejectReason::InvalidDate(date_raw.to_string()));
        };

        let amount = match self.signed_amount(cols, row) {
            Ok(Some(a)) => a,
            Ok(None) => return RowOutcome::ZeroAmount,
            Err(reason) => return RowOutcome::Rejected(reason),
        };

        let description = cell(row, Some(&cols.description)).unwrap_or_default();

        let mut txn = Transaction::new(id, date, description, amount);
        if let Some(cp) = cell(row, cols.counterparty.as_ref()) {
            txn = txn.with_counterparty(cp);
        }
        if let Some(cat) = cell(row, cols.category.as_ref()) {
            txn = txn.with_source_category(cat);
        }
        RowOutcome::Parsed(txn)
    }

    /// `Ok(None)` means the row nets to zero.
    fn signed_amount(
        &self,
        cols: &ResolvedColumns,
        row: &RawRow,
    ) -> std::result::Result<Option<Decimal>, RejectReason> {
        let debit_raw = cell(row, cols.debit.as_ref());
        let credit_raw = cell(row, cols.credit.as_ref());
        let amount_raw = cell(row, cols.amount.as_ref());

        if debit_raw.is_some() || credit_raw.is_some() {
            let net = magnitude(credit_raw)? - magnitude(debit_raw)?;
            if !net.is_zero() || amount_raw.is_none() {
                return Ok(Some(net).filter(|n| !n.is_zero()));
            }
        }

        let Some(raw) = amount_raw else {
            return Err(RejectReason::MissingAmount);
        };
        let mut value =
            parse_amount(raw).ok_or_else(|| RejectReason::InvalidAmount(raw.to_string()))?;
        if self.amount_sign == AmountSign::OutflowPositive {
            value = -value;
        }
        match cell(row, cols.direction.as_ref()).and_then(parse_direction_flag) {
            Some(Direction::Inflow) => value = value.abs(),
            Some(Direction::Outflow) => value = -value.abs(),
            None => {}
        }

        Ok(Some(value).filter(|v| !v.is_zero()))
    }
}

/// Trimmed, non-empty cell text for a resolved column
fn cell<'a>(row: &'a RawRow, column: Option<&String>) -> Option<&'a str> {
    column
        .and_then(|c| row.get(c))
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

/// Absolute value of a debit/credit cell; an empty cell counts as zero
fn magnitude(raw: Option<&str>) -> std::result::Result<Decimal, RejectReason> {
    match raw {
        Some(r) => parse_amount(r)
            .map(|v| v.abs())
            .ok_or_else(|| RejectReason::InvalidAmount(r.to_string())),
        None => Ok(Decimal::ZERO),
    }
}

fn finish(out: &ParsedStatement) {
    debug!(
        "Parsed {} transactions from {} rows ({} rejected, {} zero-amount)",
        out.transactions.len(),
        out.rows_read,
        out.rejected_count(),
        out.dropped_zero
    );
}
