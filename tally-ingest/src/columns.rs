//! Locate logical fields among the uploaded file's headers.

use tally_core::{ColumnMapping, Error, LogicalField, Result};

/// Header text reduced to lowercase alphanumerics, so `Transaction_Date`,
/// `transaction date` and `TRANSACTION-DATE` compare equal.
pub fn normalize_header(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Actual header names chosen for each logical field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub date: String,
    pub description: String,
    pub amount: Option<String>,
    pub debit: Option<String>,
    pub credit: Option<String>,
    pub direction: Option<String>,
    pub counterparty: Option<String>,
    pub category: Option<String>,
}

fn find(mapping: &ColumnMapping, field: LogicalField, headers: &[String]) -> Option<String> {
    // explicit renames first, exact then normalized
    for source in mapping.renamed(field) {
        if let Some(h) = headers.iter().find(|h| h.as_str() == source) {
            return Some(h.clone());
        }
        let wanted = normalize_header(source);
        if let Some(h) = headers.iter().find(|h| normalize_header(h) == wanted) {
            return Some(h.clone());
        }
    }

    mapping.aliases(field).iter().find_map(|alias| {
        let wanted = normalize_header(alias);
        headers.iter().find(|h| normalize_header(h) == wanted).cloned()
    })
}

impl ResolvedColumns {
    /// Resolve every field against `headers`.
    ///
    /// Fails with [`Error::StructuralInput`] when the date, description or
    /// every monetary column (amount, debit, credit) is missing.
    pub fn resolve(mapping: &ColumnMapping, headers: &[String]) -> Result<Self> {
        let date = find(mapping, LogicalField::Date, headers)
            .ok_or_else(|| Error::structural("date", headers))?;
        let description = find(mapping, LogicalField::Description, headers)
            .ok_or_else(|| Error::structural("description", headers))?;

        let amount = find(mapping, LogicalField::Amount, headers);
        let debit = find(mapping, LogicalField::Debit, headers);
        let credit = find(mapping, LogicalField::Credit, headers);
        if amount.is_none() && debit.is_none() && credit.is_none() {
            return Err(Error::structural("amount (or debit/credit)", headers));
        }

        Ok(Self {
            date,
            description,
            amount,
            debit,
            credit,
            direction: find(mapping, LogicalField::Direction, headers),
            counterparty: find(mapping, LogicalField::Counterparty, headers),
            category: find(mapping, LogicalField::Category, headers),
        })
    }

    pub fn has_debit_credit(&self) -> bool {
        self.debit.is_some() || self.credit.is_some()
    }
}
