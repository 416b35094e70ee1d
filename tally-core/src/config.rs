//! Analysis configuration: column mapping, date formats, rules, ranking and
//! rounding options.
//!
//! Everything here is plain data so callers can build it in code or load it
//! from TOML/JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::money::RoundingMode;
use crate::transaction::Direction;

pub const DEFAULT_TOP_N: usize = 10;

/// Date formats tried in order. Ambiguous numeric dates read month-first
/// (`01/03/2024` is 3 January); day-first only matches when the first
/// number cannot be a month. Put `%d/%m/%Y` in `date_formats` to flip that.
pub const DEFAULT_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%d %b %Y",
    "%d-%b-%Y",
    "%d-%b-%y",
    "%b %d, %Y",
    "%m/%d/%y",
    "%d/%m/%y",
    "%Y%m%d",
];

/// Logical fields the statement parser understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalField {
    Date,
    Description,
    Amount,
    Debit,
    Credit,
    Direction,
    Counterparty,
    Category,
}

impl LogicalField {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalField::Date => "date",
            LogicalField::Description => "description",
            LogicalField::Amount => "amount",
            LogicalField::Debit => "debit",
            LogicalField::Credit => "credit",
            LogicalField::Direction => "direction",
            LogicalField::Counterparty => "counterparty",
            LogicalField::Category => "category",
        }
    }
}

/// Which source columns feed which logical field.
///
/// `rename` maps an exact source column name to a field and wins over the
/// alias lists. Alias lists are tried in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub rename: BTreeMap<String, LogicalField>,
    pub date: Vec<String>,
    pub description: Vec<String>,
    pub amount: Vec<String>,
    pub debit: Vec<String>,
    pub credit: Vec<String>,
    pub direction: Vec<String>,
    pub counterparty: Vec<String>,
    pub category: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            rename: BTreeMap::new(),
            date: strings(&[
                "Transaction_Date",
                "Date",
                "Transaction Date",
                "Txn Date",
                "Value Date",
                "Posting Date",
                "Posted Date",
            ]),
            description: strings(&[
                "Description",
                "Narration",
                "Details",
                "Memo",
                "Transaction Details",
                "Payee",
                "Particulars",
            ]),
            amount: strings(&["Amount", "Transaction Amount", "Amt"]),
            debit: strings(&["Debit_Amount", "Debit", "Withdrawal", "Withdrawal Amt", "Money Out"]),
            credit: strings(&["Credit_Amount", "Credit", "Deposit", "Deposit Amt", "Money In"]),
            direction: strings(&["Transaction_Type", "Type", "Dr/Cr", "Debit/Credit"]),
            counterparty: strings(&["Beneficiary_Name", "Beneficiary", "Merchant", "Counterparty"]),
            category: strings(&["Category"]),
        }
    }
}

impl ColumnMapping {
    /// A mapping with no aliases at all; fill it with [`ColumnMapping::map`].
    pub fn empty() -> Self {
        Self {
            rename: BTreeMap::new(),
            date: Vec::new(),
            description: Vec::new(),
            amount: Vec::new(),
            debit: Vec::new(),
            credit: Vec::new(),
            direction: Vec::new(),
            counterparty: Vec::new(),
            category: Vec::new(),
        }
    }

    /// Map an exact source column name to a logical field.
    pub fn map(mut self, source: impl Into<String>, field: LogicalField) -> Self {
        self.rename.insert(source.into(), field);
        self
    }

    pub fn aliases(&self, field: LogicalField) -> &[String] {
        match field {
            LogicalField::Date => &self.date,
            LogicalField::Description => &self.description,
            LogicalField::Amount => &self.amount,
            LogicalField::Debit => &self.debit,
            LogicalField::Credit => &self.credit,
            LogicalField::Direction => &self.direction,
            LogicalField::Counterparty => &self.counterparty,
            LogicalField::Category => &self.category,
        }
    }

    /// Source columns explicitly renamed to `field`, in name order
    pub fn renamed(&self, field: LogicalField) -> impl Iterator<Item = &str> {
        self.rename
            .iter()
            .filter(move |(_, f)| **f == field)
            .map(|(src, _)| src.as_str())
    }
}

/// Sign convention of a single signed amount column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountSign {
    /// Positive values are money in (bank accounts)
    #[default]
    InflowPositive,
    /// Positive values are money out (card statements)
    OutflowPositive,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Case-insensitive substring
    #[default]
    Contains,
    /// Any of the `|`/`,` separated keywords as a whole word
    Keywords,
    StartsWith,
    /// Case-insensitive regular expression
    Regex,
}

/// One ordered categorization rule as written in configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub pattern: String,
    pub category: String,
    #[serde(default)]
    pub match_type: MatchType,
    /// Restrict the rule to inflows or outflows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
}

impl RuleSpec {
    pub fn new(pattern: impl Into<String>, category: impl Into<String>, match_type: MatchType) -> Self {
        Self {
            pattern: pattern.into(),
            category: category.into(),
            match_type,
            direction: None,
        }
    }

    pub fn contains(pattern: impl Into<String>, category: impl Into<String>) -> Self {
        Self::new(pattern, category, MatchType::Contains)
    }

    pub fn keywords(keywords: &[&str], category: impl Into<String>) -> Self {
        Self::new(keywords.join("|"), category, MatchType::Keywords)
    }

    pub fn regex(pattern: impl Into<String>, category: impl Into<String>) -> Self {
        Self::new(pattern, category, MatchType::Regex)
    }

    pub fn for_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub columns: ColumnMapping,
    pub date_formats: Vec<String>,
    pub amount_sign: AmountSign,
    /// Caller rules, evaluated before the built-in set
    pub rules: Vec<RuleSpec>,
    pub use_default_rules: bool,
    /// Fall back to the export's own category column before "Uncategorized"
    pub use_source_category: bool,
    pub top_n: usize,
    pub rounding_mode: RoundingMode,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            columns: ColumnMapping::default(),
            date_formats: strings(DEFAULT_DATE_FORMATS),
            amount_sign: AmountSign::default(),
            rules: Vec::new(),
            use_default_rules: true,
            use_source_category: true,
            top_n: DEFAULT_TOP_N,
            rounding_mode: RoundingMode::default(),
        }
    }
}

impl AnalysisConfig {
    /// Config that uses only the given rules
    pub fn with_rules(rules: Vec<RuleSpec>) -> Self {
        Self {
            rules,
            use_default_rules: false,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(Error::InvalidConfig("top_n must be at least 1".to_string()));
        }
        if self.date_formats.is_empty() {
            return Err(Error::InvalidConfig("date_formats must not be empty".to_string()));
        }
        if let Some(bad) = self.date_formats.iter().find(|f| f.trim().is_empty()) {
            return Err(Error::InvalidConfig(format!("blank date format '{bad}'")));
        }
        Ok(())
    }
}
