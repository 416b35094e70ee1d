//! Insight summary: the presentation-ready result of one analysis run.
//!
//! The builder only reshapes and rounds. All sums come from the
//! [`Aggregation`] and all orderings from [`FlowRankings`]; each presented
//! figure is rounded exactly once, here.
//!
//! Bucket totals are rounded together per direction with
//! [`RoundingMode::allocate`]. Category, month and grand totals are then
//! sums of those rounded buckets, so every table adds up to the totals.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

use tally_core::{Category, Direction, MonthKey, Result, RoundingMode};
use tally_ingest::RejectedRow;

use crate::aggregator::{Aggregation, BucketKey, FlowTotals};
use crate::flow_ranker::{DirectionFlows, FlowGroup, FlowRankings, RankedFlow};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// No valid transactions remained after parsing
    EmptyDataset { rows_read: usize, rejected: usize },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::EmptyDataset { rows_read, rejected } => write!(
                f,
                "no valid transactions ({rows_read} rows read, {rejected} rejected)"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Totals {
    pub inflow: Decimal,
    pub outflow: Decimal,
    pub net: Decimal,
    pub inflow_count: usize,
    pub outflow_count: usize,
}

/// One row of the monthly income vs spending table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthRow {
    pub month: MonthKey,
    pub label: String,
    pub inflow: Decimal,
    pub outflow: Decimal,
    pub net: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRow {
    pub category: Category,
    pub total: Decimal,
    pub count: usize,
    /// Percent of the direction's total
    pub share: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTables {
    pub inflow: Vec<CategoryRow>,
    pub outflow: Vec<CategoryRow>,
}

impl CategoryTables {
    pub fn get(&self, direction: Direction) -> &[CategoryRow] {
        match direction {
            Direction::Inflow => &self.inflow,
            Direction::Outflow => &self.outflow,
        }
    }
}

/// One `(month, direction, category)` bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryMonthRow {
    pub month: MonthKey,
    pub direction: Direction,
    pub category: Category,
    pub total: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRow {
    pub rank: usize,
    pub label: String,
    pub count: usize,
    pub total: Decimal,
    pub first_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowRow {
    pub rank: usize,
    pub transaction_id: usize,
    pub date: NaiveDate,
    pub label: String,
    pub category: Category,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionFlowTables {
    pub most_frequent: Vec<GroupRow>,
    pub highest_value: Vec<FlowRow>,
    pub largest_total: Vec<GroupRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowTables {
    pub inflow: DirectionFlowTables,
    pub outflow: DirectionFlowTables,
}

impl FlowTables {
    pub fn get(&self, direction: Direction) -> &DirectionFlowTables {
        match direction {
            Direction::Inflow => &self.inflow,
            Direction::Outflow => &self.outflow,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    pub rows_read: usize,
    pub transactions: usize,
    pub rejected_count: usize,
    pub rejected: Vec<RejectedRow>,
    pub dropped_zero: usize,
    pub uncategorized_count: usize,
    pub warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new(
        rows_read: usize,
        transactions: usize,
        rejected: Vec<RejectedRow>,
        dropped_zero: usize,
        uncategorized_count: usize,
    ) -> Self {
        Self {
            rows_read,
            transactions,
            rejected_count: rejected.len(),
            rejected,
            dropped_zero,
            uncategorized_count,
            warnings: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightSummary {
    pub totals: Totals,
    pub monthly: Vec<MonthRow>,
    pub categories: CategoryTables,
    pub category_by_month: Vec<CategoryMonthRow>,
    pub flows: FlowTables,
    pub diagnostics: Diagnostics,
}

impl InsightSummary {
    pub fn is_empty(&self) -> bool {
        self.diagnostics.transactions == 0
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Rounded money figures of one run, keyed like the [`Aggregation`]
struct PresentedMoney<'a> {
    zero: Decimal,
    buckets: BTreeMap<&'a BucketKey, Decimal>,
    categories: BTreeMap<(Direction, &'a Category), Decimal>,
    months: BTreeMap<MonthKey, FlowTotals>,
    totals: FlowTotals,
}

impl PresentedMoney<'_> {
    fn bucket(&self, key: &BucketKey) -> Decimal {
        self.buckets.get(key).copied().unwrap_or(self.zero)
    }

    fn category(&self, direction: Direction, category: &Category) -> Decimal {
        self.categories
            .get(&(direction, category))
            .copied()
            .unwrap_or(self.zero)
    }
}

fn add_to(totals: &mut FlowTotals, direction: Direction, value: Decimal) {
    match direction {
        Direction::Inflow => totals.inflow += value,
        Direction::Outflow => totals.outflow += value,
    }
}

/// Turns aggregates and rankings into an [`InsightSummary`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryBuilder {
    rounding: RoundingMode,
}

impl SummaryBuilder {
    pub fn new(rounding: RoundingMode) -> Self {
        Self { rounding }
    }

    pub fn build(&self, agg: &Aggregation, flows: &FlowRankings, mut diagnostics: Diagnostics) -> InsightSummary {
        if agg.is_empty() {
            let warning = Warning::EmptyDataset {
                rows_read: diagnostics.rows_read,
                rejected: diagnostics.rejected_count,
            };
            warn!("{}", warning);
            diagnostics.warnings.push(warning);
        }

        let money = self.present(agg);
        InsightSummary {
            totals: Totals {
                inflow: money.totals.inflow,
                outflow: money.totals.outflow,
                net: money.totals.net(),
                inflow_count: money.totals.inflow_count,
                outflow_count: money.totals.outflow_count,
            },
            monthly: money
                .months
                .iter()
                .map(|(month, t)| MonthRow {
                    month: *month,
                    label: month.short_label(),
                    inflow: t.inflow,
                    outflow: t.outflow,
                    net: t.net(),
                })
                .collect(),
            categories: CategoryTables {
                inflow: self.category_rows(agg, &money, Direction::Inflow),
                outflow: self.category_rows(agg, &money, Direction::Outflow),
            },
            category_by_month: agg
                .buckets
                .iter()
                .map(|(key, bucket)| CategoryMonthRow {
                    month: key.month,
                    direction: key.direction,
                    category: key.category.clone(),
                    total: money.bucket(key),
                    count: bucket.count,
                })
                .collect(),
            flows: FlowTables {
                inflow: self.flow_tables(&flows.inflow),
                outflow: self.flow_tables(&flows.outflow),
            },
            diagnostics,
        }
    }

    /// Round the buckets and roll the rounded values up
    fn present<'a>(&self, agg: &'a Aggregation) -> PresentedMoney<'a> {
        let zero = self.rounding.money(Decimal::ZERO);
        let cleared = |t: &FlowTotals| FlowTotals {
            inflow: zero,
            outflow: zero,
            ..*t
        };
        let mut money = PresentedMoney {
            zero,
            buckets: BTreeMap::new(),
            categories: BTreeMap::new(),
            months: agg.month_totals.iter().map(|(m, t)| (*m, cleared(t))).collect(),
            totals: cleared(&agg.totals),
        };

        for direction in Direction::ALL {
            let (keys, exact): (Vec<&BucketKey>, Vec<Decimal>) = agg
                .buckets
                .iter()
                .filter(|(k, _)| k.direction == direction)
                .map(|(k, b)| (k, b.sum))
                .unzip();
            for (key, value) in keys.into_iter().zip(self.rounding.allocate(&exact)) {
                *money.categories.entry((direction, &key.category)).or_insert(zero) += value;
                if let Some(month) = money.months.get_mut(&key.month) {
                    add_to(month, direction, value);
                }
                add_to(&mut money.totals, direction, value);
                money.buckets.insert(key, value);
            }
        }
        money
    }

    /// Largest first; equal totals by name
    fn category_rows(&self, agg: &Aggregation, money: &PresentedMoney<'_>, direction: Direction) -> Vec<CategoryRow> {
        let mut exact: Vec<_> = agg.categories(direction).collect();
        exact.sort_by(|(ca, a), (cb, b)| b.sum.cmp(&a.sum).then_with(|| ca.cmp(cb)));
        exact
            .into_iter()
            .map(|(category, t)| CategoryRow {
                category: category.clone(),
                total: money.category(direction, category),
                count: t.count,
                share: self.rounding.share(t.share),
            })
            .collect()
    }

    fn flow_tables(&self, flows: &DirectionFlows) -> DirectionFlowTables {
        let group = |g: &FlowGroup| GroupRow {
            rank: g.rank,
            label: g.label.clone(),
            count: g.count,
            total: self.rounding.money(g.total),
            first_date: g.first_date,
        };
        let single = |f: &RankedFlow| FlowRow {
            rank: f.rank,
            transaction_id: f.transaction_id,
            date: f.date,
            label: f.label.clone(),
            category: f.category.clone(),
            amount: self.rounding.money(f.amount),
        };
        DirectionFlowTables {
            most_frequent: flows.most_frequent.iter().map(group).collect(),
            highest_value: flows.highest_value.iter().map(single).collect(),
            largest_total: flows.largest_total.iter().map(group).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::Aggregator;
    use crate::flow_ranker::FlowRanker;
    use std::str::FromStr;
    use tally_core::{CategorizedTransaction, Transaction};
    use tally_ingest::RejectReason;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn ct(id: usize, month: u32, desc: &str, amount: &str, category: &str) -> CategorizedTransaction {
        let t = Transaction::new(
            id,
            NaiveDate::from_ymd_opt(2024, month, 3).unwrap(),
            desc,
            d(amount),
        );
        CategorizedTransaction::new(t, Category::new(category))
    }

    fn summarize(txns: &[CategorizedTransaction], rounding: RoundingMode) -> InsightSummary {
        let agg = Aggregator::aggregate(txns);
        let flows = FlowRanker::new(10).rank(txns);
        let diag = Diagnostics::new(txns.len(), txns.len(), Vec::new(), 0, 0);
        SummaryBuilder::new(rounding).build(&agg, &flows, diag)
    }

    #[test]
    fn test_every_month_and_category_is_presented() {
        let txns = vec![
            ct(0, 1, "Salary", "5000", "Income"),
            ct(1, 1, "Cafe", "-4.50", "Dining"),
            ct(2, 3, "Rent", "-1500", "Housing"),
            ct(3, 3, "Cafe", "-6.25", "Dining"),
        ];
        let s = summarize(&txns, RoundingMode::HalfEven);

        let months: Vec<String> = s.monthly.iter().map(|m| m.month.to_string()).collect();
        assert_eq!(months, vec!["2024-01", "2024-03"]);
        assert_eq!(s.monthly[0].label, "Jan 2024");
        assert_eq!(s.monthly[1].net, d("-1506.25"));

        let outflow: Vec<&str> = s.categories.outflow.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(outflow, vec!["Housing", "Dining"]);
        assert_eq!(s.categories.get(Direction::Inflow)[0].share, d("100.0"));
        assert_eq!(s.category_by_month.len(), 4);
        assert!(s.diagnostics.warnings.is_empty());
    }

    #[test]
    fn test_rounding_happens_once_per_figure() {
        let txns = vec![
            ct(0, 1, "A", "-0.125", "Fees"),
            ct(1, 1, "B", "-0.125", "Fees"),
            ct(2, 1, "C", "-0.125", "Other"),
        ];
        let even = summarize(&txns, RoundingMode::HalfEven);
        // 0.375 exact, not 0.13 + 0.13 + 0.13
        assert_eq!(even.totals.outflow.to_string(), "0.38");
        assert_eq!(even.categories.outflow[0].total.to_string(), "0.25");
        assert_eq!(even.flows.outflow.highest_value[0].amount.to_string(), "0.12");
        // 66.666.. and 33.333..
        assert_eq!(even.categories.outflow[0].share.to_string(), "66.7");
        assert_eq!(even.categories.outflow[1].share.to_string(), "33.3");

        let trunc = summarize(&txns, RoundingMode::Truncate);
        assert_eq!(trunc.totals.outflow.to_string(), "0.37");
        assert_eq!(trunc.categories.outflow[0].share.to_string(), "66.6");
    }

    #[test]
    fn test_rounded_tables_add_up_to_rounded_totals() {
        let txns = vec![
            ct(0, 1, "Bank", "-0.125", "Fees"),
            ct(1, 2, "Bank", "-0.125", "Fees"),
            ct(2, 3, "Bank", "-0.125", "Fees"),
        ];
        let s = summarize(&txns, RoundingMode::HalfEven);

        assert_eq!(s.totals.outflow.to_string(), "0.38");
        assert_eq!(s.totals.net.to_string(), "-0.38");
        let months: Vec<String> = s.monthly.iter().map(|m| m.outflow.to_string()).collect();
        assert_eq!(months, vec!["0.13", "0.13", "0.12"]);
        let buckets: Vec<String> = s.category_by_month.iter().map(|r| r.total.to_string()).collect();
        assert_eq!(buckets, months);
        assert_eq!(s.categories.outflow[0].total.to_string(), "0.38");
        assert_eq!(s.monthly.iter().map(|m| m.net).sum::<Decimal>(), s.totals.net);
        assert_eq!(s.monthly[0].inflow.to_string(), "0.00");

        // single transactions are still rounded on their own
        assert_eq!(s.flows.outflow.highest_value[0].amount.to_string(), "0.12");
        assert_eq!(s.flows.outflow.largest_total[0].total.to_string(), "0.38");
    }

    #[test]
    fn test_money_serializes_as_fixed_point_strings() {
        let s = summarize(&[ct(0, 1, "Salary", "5000", "Income")], RoundingMode::HalfEven);
        let v = s.to_value().unwrap();
        assert_eq!(v["totals"]["inflow"], "5000.00");
        assert_eq!(v["totals"]["outflow"], "0.00");
        assert_eq!(v["monthly"][0]["month"], "2024-01");
        assert_eq!(v["categories"]["inflow"][0]["category"], "Income");
        assert_eq!(v["category_by_month"][0]["direction"], "inflow");
        assert_eq!(v["flows"]["inflow"]["most_frequent"][0]["label"], "Salary");
        assert_eq!(v["flows"]["inflow"]["highest_value"][0]["date"], "2024-01-03");
    }

    #[test]
    fn test_empty_dataset_warning() {
        let agg = Aggregator::aggregate(&[]);
        let flows = FlowRanker::new(10).rank(&[]);
        let rejected = vec![RejectedRow {
            row: 0,
            reason: RejectReason::InvalidAmount("N/A".to_string()),
        }];
        let s = SummaryBuilder::default().build(&agg, &flows, Diagnostics::new(1, 0, rejected, 0, 0));

        assert!(s.is_empty());
        assert_eq!(s.totals.net, Decimal::ZERO);
        assert!(s.monthly.is_empty());
        assert_eq!(
            s.diagnostics.warnings,
            vec![Warning::EmptyDataset { rows_read: 1, rejected: 1 }]
        );

        let v = s.to_value().unwrap();
        assert_eq!(v["diagnostics"]["warnings"][0]["kind"], "empty_dataset");
        assert_eq!(v["diagnostics"]["rejected"][0]["reason"], "invalid_amount");
        assert_eq!(v["diagnostics"]["rejected"][0]["value"], "N/A");
    }
}
