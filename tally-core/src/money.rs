//! Exact money helpers: presentation rounding and display formatting.
//!
//! Sums are always accumulated on unrounded `Decimal`s. Rounding is applied
//! once, when a figure is presented. Figures that are shown next to their
//! total go through [`RoundingMode::allocate`] so the rounded parts still add
//! up to the rounded whole.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Decimal places for presented money values.
pub const MONEY_DP: u32 = 2;

/// Decimal places for presented percentage shares.
pub const SHARE_DP: u32 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Round half to even (banker's rounding)
    #[default]
    HalfEven,
    /// Drop extra digits toward zero
    Truncate,
}

impl RoundingMode {
    fn strategy(self) -> RoundingStrategy {
        match self {
            RoundingMode::HalfEven => RoundingStrategy::MidpointNearestEven,
            RoundingMode::Truncate => RoundingStrategy::ToZero,
        }
    }

    /// Round to `dp` places and pad the scale so `5000` presents as `5000.00`.
    pub fn round(self, value: Decimal, dp: u32) -> Decimal {
        let mut out = value.round_dp_with_strategy(dp, self.strategy());
        out.rescale(dp);
        out
    }

    pub fn money(self, value: Decimal) -> Decimal {
        self.round(value, MONEY_DP)
    }

    pub fn share(self, value: Decimal) -> Decimal {
        self.round(value, SHARE_DP)
    }

    /// Round non-negative `parts` to money so they sum to `money(sum of parts)`.
    ///
    /// Largest remainder: every part is cut to whole cents, then the cents
    /// still missing from the rounded total go to the parts that lost the
    /// most, earlier parts first on ties. Output order matches input order.
    /// A negative part disables the allocation and each part is rounded alone.
    pub fn allocate(self, parts: &[Decimal]) -> Vec<Decimal> {
        if parts.iter().any(|p| p.is_sign_negative() && !p.is_zero()) {
            return parts.iter().map(|p| self.money(*p)).collect();
        }

        let target = self.money(parts.iter().sum());
        let mut out: Vec<Decimal> = parts.iter().map(|p| RoundingMode::Truncate.money(*p)).collect();
        let floor: Decimal = out.iter().sum();

        let cent = Decimal::new(1, MONEY_DP);
        let missing = ((target - floor) / cent).to_usize().unwrap_or(0);
        if missing > 0 {
            let mut order: Vec<usize> = (0..parts.len()).collect();
            order.sort_by(|&a, &b| {
                (parts[b] - out[b])
                    .cmp(&(parts[a] - out[a]))
                    .then(a.cmp(&b))
            });
            for i in order.into_iter().take(missing) {
                out[i] += cent;
            }
        }
        out
    }
}

/// Format a decimal as a money string with thousands separators: 1,234.56
///
/// Uses half-even rounding to two places; callers that already rounded get
/// the same digits back.
pub fn money(val: Decimal) -> String {
    let rounded = RoundingMode::HalfEven.money(val);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = rounded.abs().to_string();
    let (int_part, dec_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative {
        format!("-{with_commas}.{dec_part}")
    } else {
        format!("{with_commas}.{dec_part}")
    }
}
