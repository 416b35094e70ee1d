//! Amount cells: currency symbols, thousands separators and the usual
//! negative notations.

use rust_decimal::Decimal;
use std::str::FromStr;

use tally_core::Direction;

/// Largest magnitude accepted for a single cell (10^15). Sums of many such rows
/// stay far inside `Decimal`'s range, so aggregation cannot overflow.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

const CURRENCY_CODES: &[&str] = &["usd", "inr", "eur", "gbp", "aud", "cad", "rs.", "rs"];

fn is_noise(c: char) -> bool {
    matches!(
        c,
        ',' | '_' | ' ' | '\u{a0}' | '\'' | '$' | '€' | '£' | '₹' | '¥' | '₩'
    )
}

fn strip_ci_prefix<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

fn strip_ci_suffix<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let cut = s.len().checked_sub(suffix.len())?;
    let tail = s.get(cut..)?;
    tail.eq_ignore_ascii_case(suffix).then(|| &s[..cut])
}

fn strip_currency_code(s: &str) -> &str {
    for code in CURRENCY_CODES {
        if let Some(rest) = strip_ci_prefix(s, code) {
            return rest.trim();
        }
        if let Some(rest) = strip_ci_suffix(s, code) {
            return rest.trim();
        }
    }
    s
}

/// Parse a money cell into a signed decimal.
///
/// Handles `1,234.56`, `$1,234.56`, `-$50.00`, `(500.00)`, `500.00-`,
/// `INR 1,200`, `Rs. 1,200`, `1,200.00 Dr` and `1,200.00 Cr`.
/// Returns `None` for empty or non-numeric text such as `N/A`, and for
/// magnitudes above [`MAX_AMOUNT`].
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let mut s = raw.trim().trim_matches('"').trim();
    if s.is_empty() {
        return None;
    }

    let mut negative = false;
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        negative = true;
        s = inner.trim();
    }

    if let Some(rest) = strip_ci_suffix(s, "dr") {
        negative = true;
        s = rest.trim();
    } else if let Some(rest) = strip_ci_suffix(s, "cr") {
        s = rest.trim();
    }

    if let Some(rest) = s.strip_suffix('-') {
        negative = true;
        s = rest.trim();
    }

    let s = strip_currency_code(s);
    let cleaned: String = s.chars().filter(|c| !is_noise(*c)).collect();
    let cleaned = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    if cleaned.is_empty() {
        return None;
    }

    let value = Decimal::from_str(cleaned).ok()?;
    if value.abs() > MAX_AMOUNT {
        return None;
    }
    Some(if negative { -value.abs() } else { value })
}

/// Read a debit/credit flag column. Unknown values yield `None`.
pub fn parse_direction_flag(raw: &str) -> Option<Direction> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "debit" | "dr" | "d" | "withdrawal" | "debited" | "out" => Some(Direction::Outflow),
        "credit" | "cr" | "c" | "deposit" | "credited" | "in" => Some(Direction::Inflow),
        _ => None,
    }
}
