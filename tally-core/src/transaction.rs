//! Transaction types shared across the pipeline

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::period::MonthKey;

/// Direction of a transaction's monetary effect on the account holder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inflow,
    Outflow,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Inflow, Direction::Outflow];

    /// Direction implied by a signed amount. `None` for zero.
    pub fn of(amount: Decimal) -> Option<Direction> {
        if amount > Decimal::ZERO {
            Some(Direction::Inflow)
        } else if amount < Decimal::ZERO {
            Some(Direction::Outflow)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Inflow => "inflow",
            Direction::Outflow => "outflow",
        }
    }

    /// Heading used in reports
    pub fn heading(&self) -> &'static str {
        match self {
            Direction::Inflow => "Income",
            Direction::Outflow => "Spending",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A semantic category (income source or spending category).
///
/// Categories are data supplied by rule sets, so this is a string newtype
/// rather than a closed enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub const UNCATEGORIZED: &'static str = "Uncategorized";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn uncategorized() -> Self {
        Self(Self::UNCATEGORIZED.to_string())
    }

    pub fn is_uncategorized(&self) -> bool {
        self.0 == Self::UNCATEGORIZED
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// One validated ledger entry produced by the statement parser
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    /// Zero-based index of the source record in the uploaded dataset,
    /// counted the same way as rejected rows
    pub id: usize,
    pub date: NaiveDate,
    pub description: String,
    /// Beneficiary / merchant column, when the export has one
    pub counterparty: Option<String>,
    /// Category supplied by the bank export itself
    pub source_category: Option<String>,
    /// Positive = inflow, negative = outflow. Never zero.
    pub amount: Decimal,
}

impl Transaction {
    /// `amount` must be non-zero; zero rows are dropped before they become
    /// transactions. Debug builds panic on a zero amount.
    pub fn new(id: usize, date: NaiveDate, description: impl Into<String>, amount: Decimal) -> Self {
        debug_assert!(!amount.is_zero(), "transaction {id} has a zero amount");
        Self {
            id,
            date,
            description: description.into(),
            counterparty: None,
            source_category: None,
            amount,
        }
    }

    pub fn with_counterparty(mut self, counterparty: impl Into<String>) -> Self {
        self.counterparty = Some(counterparty.into());
        self
    }

    pub fn with_source_category(mut self, category: impl Into<String>) -> Self {
        self.source_category = Some(category.into());
        self
    }

    pub fn direction(&self) -> Direction {
        // zero never gets here in debug builds; `new` refuses it
        Direction::of(self.amount).unwrap_or(Direction::Outflow)
    }

    pub fn is_inflow(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    pub fn is_outflow(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    pub fn abs_amount(&self) -> Decimal {
        self.amount.abs()
    }

    pub fn month(&self) -> MonthKey {
        MonthKey::from_date(self.date)
    }

    /// Text identifying who the money went to or came from: the counterparty
    /// column when filled, else the description.
    pub fn merchant_text(&self) -> &str {
        self.counterparty
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(&self.description)
    }

    /// Normalized key for grouping flows by merchant.
    ///
    /// Lowercased, punctuation folded to spaces, digit-only tokens (reference
    /// numbers) dropped, whitespace collapsed.
    pub fn merchant_key(&self) -> String {
        normalize_merchant(self.merchant_text())
    }

    /// Display label for the merchant: the source text with whitespace collapsed
    pub fn merchant_label(&self) -> String {
        let label = collapse_whitespace(self.merchant_text());
        if label.is_empty() {
            "(no description)".to_string()
        } else {
            label
        }
    }
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn normalize_merchant(s: &str) -> String {
    let folded: String = s
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    let key = folded
        .split_whitespace()
        .filter(|t| !t.chars().all(|c| c.is_ascii_digit()))
        .collect::<Vec<_>>()
        .join(" ");

    if key.is_empty() {
        // all-numeric descriptions still need a stable key
        collapse_whitespace(&s.to_lowercase())
    } else {
        key
    }
}

/// A transaction with its assigned category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategorizedTransaction {
    pub transaction: Transaction,
    pub category: Category,
}

impl CategorizedTransaction {
    pub fn new(transaction: Transaction, category: Category) -> Self {
        Self {
            transaction,
            category,
        }
    }

    pub fn direction(&self) -> Direction {
        self.transaction.direction()
    }

    pub fn month(&self) -> MonthKey {
        self.transaction.month()
    }

    pub fn abs_amount(&self) -> Decimal {
        self.transaction.abs_amount()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn txn(desc: &str, amount: &str) -> Transaction {
        Transaction::new(
            0,
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            desc,
            Decimal::from_str(amount).unwrap(),
        )
    }

    #[test]
    fn test_direction_from_sign() {
        assert_eq!(txn("Salary", "5000").direction(), Direction::Inflow);
        assert_eq!(txn("Coffee", "-4.50").direction(), Direction::Outflow);
        assert_eq!(Direction::of(Decimal::ZERO), None);
        assert!(txn("Coffee", "-4.50").is_outflow());
        assert_eq!(txn("Coffee", "-4.50").abs_amount(), Decimal::from_str("4.50").unwrap());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "zero amount")]
    fn test_zero_amount_is_refused() {
        txn("Fee reversal", "0.00");
    }

    #[test]
    fn test_merchant_key_drops_reference_numbers() {
        let a = txn("UPI/123456/SWIGGY  Bangalore", "-200");
        let b = txn("upi 998877 swiggy bangalore", "-150");
        assert_eq!(a.merchant_key(), "upi swiggy bangalore");
        assert_eq!(a.merchant_key(), b.merchant_key());
    }

    #[test]
    fn test_merchant_prefers_counterparty() {
        let t = txn("NEFT 4411 transfer", "-900").with_counterparty("  Landlord   Sharma ");
        assert_eq!(t.merchant_label(), "Landlord Sharma");
        assert_eq!(t.merchant_key(), "landlord sharma");

        let blank = txn("Coffee  Shop", "-4.50").with_counterparty("   ");
        assert_eq!(blank.merchant_label(), "Coffee Shop");
    }

    #[test]
    fn test_numeric_only_description_keeps_a_key() {
        let t = txn("  00123 ", "-10");
        assert_eq!(t.merchant_key(), "00123");
        assert_eq!(txn("", "-10").merchant_label(), "(no description)");
    }

    #[test]
    fn test_category_serializes_as_plain_string() {
        let c = Category::new("Dining");
        assert_eq!(serde_json::to_string(&c).unwrap(), "\"Dining\"");
        assert!(Category::uncategorized().is_uncategorized());
        assert_eq!(Category::from("Income").as_str(), "Income");
    }
}
