//! Monthly aggregation of categorized transactions.
//!
//! Every transaction lands in exactly one `(month, direction, category)`
//! bucket. Sums are exact absolute magnitudes; nothing is rounded here.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

use tally_core::{CategorizedTransaction, Category, Direction, MonthKey};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketKey {
    pub month: MonthKey,
    pub direction: Direction,
    pub category: Category,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonthlyBucket {
    pub sum: Decimal,
    pub count: usize,
}

impl MonthlyBucket {
    fn add(&mut self, amount: Decimal) {
        self.sum += amount;
        self.count += 1;
    }
}

/// Per (direction, category) total across all months
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryTotal {
    pub sum: Decimal,
    pub count: usize,
    /// Percent of the direction's total, unrounded
    pub share: Decimal,
}

/// Inflow and outflow for one month
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlowTotals {
    pub inflow: Decimal,
    pub outflow: Decimal,
    pub inflow_count: usize,
    pub outflow_count: usize,
}

impl FlowTotals {
    fn add(&mut self, direction: Direction, amount: Decimal) {
        match direction {
            Direction::Inflow => {
                self.inflow += amount;
                self.inflow_count += 1;
            }
            Direction::Outflow => {
                self.outflow += amount;
                self.outflow_count += 1;
            }
        }
    }

    pub fn net(&self) -> Decimal {
        self.inflow - self.outflow
    }

    pub fn get(&self, direction: Direction) -> Decimal {
        match direction {
            Direction::Inflow => self.inflow,
            Direction::Outflow => self.outflow,
        }
    }

    pub fn count(&self, direction: Direction) -> usize {
        match direction {
            Direction::Inflow => self.inflow_count,
            Direction::Outflow => self.outflow_count,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    pub buckets: BTreeMap<BucketKey, MonthlyBucket>,
    pub category_totals: BTreeMap<(Direction, Category), CategoryTotal>,
    pub month_totals: BTreeMap<MonthKey, FlowTotals>,
    pub totals: FlowTotals,
}

impl Aggregation {
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn months(&self) -> impl Iterator<Item = MonthKey> + '_ {
        self.month_totals.keys().copied()
    }

    /// Categories of one direction, in name order
    pub fn categories(&self, direction: Direction) -> impl Iterator<Item = (&Category, &CategoryTotal)> {
        self.category_totals
            .iter()
            .filter(move |((d, _), _)| *d == direction)
            .map(|((_, c), t)| (c, t))
    }

    pub fn bucket(&self, month: MonthKey, direction: Direction, category: &Category) -> Option<&MonthlyBucket> {
        self.buckets.get(&BucketKey {
            month,
            direction,
            category: category.clone(),
        })
    }

    /// Bucket sums, category sums, month sums and the grand total agree for
    /// each direction, and so do the counts.
    pub fn check_consistency(&self) -> bool {
        Direction::ALL.into_iter().all(|direction| {
            let grand = self.totals.get(direction);
            let grand_count = self.totals.count(direction);

            let (bucket_sum, bucket_count) = self
                .buckets
                .iter()
                .filter(|(k, _)| k.direction == direction)
                .fold((Decimal::ZERO, 0), |(s, n), (_, b)| (s + b.sum, n + b.count));
            let (cat_sum, cat_count) = self
                .categories(direction)
                .fold((Decimal::ZERO, 0), |(s, n), (_, t)| (s + t.sum, n + t.count));
            let (month_sum, month_count) = self
                .month_totals
                .values()
                .fold((Decimal::ZERO, 0), |(s, n), m| (s + m.get(direction), n + m.count(direction)));

            bucket_sum == grand
                && cat_sum == grand
                && month_sum == grand
                && bucket_count == grand_count
                && cat_count == grand_count
                && month_count == grand_count
        })
    }
}

/// Folds categorized transactions into an [`Aggregation`]
pub struct Aggregator;

impl Aggregator {
    pub fn aggregate(txns: &[CategorizedTransaction]) -> Aggregation {
        let mut agg = Aggregation::default();

        for ct in txns {
            let direction = ct.direction();
            let month = ct.month();
            let amount = ct.abs_amount();

            agg.buckets
                .entry(BucketKey {
                    month,
                    direction,
                    category: ct.category.clone(),
                })
                .or_default()
                .add(amount);

            let cat = agg
                .category_totals
                .entry((direction, ct.category.clone()))
                .or_default();
            cat.sum += amount;
            cat.count += 1;

            agg.month_totals.entry(month).or_default().add(direction, amount);
            agg.totals.add(direction, amount);
        }

        let hundred = Decimal::ONE_HUNDRED;
        for ((direction, _), total) in agg.category_totals.iter_mut() {
            let whole = agg.totals.get(*direction);
            if !whole.is_zero() {
                total.share = total.sum / whole * hundred;
            }
        }

        debug!(
            "Aggregated {} transactions into {} buckets over {} months (consistent: {})",
            txns.len(),
            agg.buckets.len(),
            agg.month_totals.len(),
            agg.check_consistency()
        );
        agg
    }
}
