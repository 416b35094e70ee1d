//! Top-N rankings of money flows, per direction.
//!
//! Three views are produced for inflows and outflows independently:
//! merchants by frequency, single transactions by value, and merchants by
//! total value. Every ordering has a full tie-break chain ending in the
//! transaction id, so rankings never depend on input order.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use tally_core::{CategorizedTransaction, Category, Direction};

/// One transaction in a ranked list
#[derive(Debug, Clone, PartialEq)]
pub struct RankedFlow {
    pub rank: usize,
    pub transaction_id: usize,
    pub date: NaiveDate,
    pub label: String,
    pub category: Category,
    /// Absolute amount
    pub amount: Decimal,
}

/// All transactions sharing a merchant key
#[derive(Debug, Clone, PartialEq)]
pub struct FlowGroup {
    pub rank: usize,
    /// Label of the earliest transaction in the group
    pub label: String,
    pub key: String,
    pub count: usize,
    /// Absolute total
    pub total: Decimal,
    pub first_date: NaiveDate,
    pub first_id: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectionFlows {
    pub most_frequent: Vec<FlowGroup>,
    pub highest_value: Vec<RankedFlow>,
    pub largest_total: Vec<FlowGroup>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowRankings {
    pub inflow: DirectionFlows,
    pub outflow: DirectionFlows,
}

impl FlowRankings {
    pub fn get(&self, direction: Direction) -> &DirectionFlows {
        match direction {
            Direction::Inflow => &self.inflow,
            Direction::Outflow => &self.outflow,
        }
    }
}

fn by_first_seen(a: &FlowGroup, b: &FlowGroup) -> Ordering {
    a.first_date.cmp(&b.first_date).then(a.first_id.cmp(&b.first_id))
}

fn by_frequency(a: &FlowGroup, b: &FlowGroup) -> Ordering {
    b.count
        .cmp(&a.count)
        .then(b.total.cmp(&a.total))
        .then_with(|| by_first_seen(a, b))
}

fn by_total(a: &FlowGroup, b: &FlowGroup) -> Ordering {
    b.total
        .cmp(&a.total)
        .then(b.count.cmp(&a.count))
        .then_with(|| by_first_seen(a, b))
}

fn by_value(a: &RankedFlow, b: &RankedFlow) -> Ordering {
    b.amount
        .cmp(&a.amount)
        .then(a.date.cmp(&b.date))
        .then(a.transaction_id.cmp(&b.transaction_id))
}

fn top<T>(mut items: Vec<T>, n: usize, order: fn(&T, &T) -> Ordering, set_rank: fn(&mut T, usize)) -> Vec<T> {
    items.sort_by(order);
    items.truncate(n);
    for (i, item) in items.iter_mut().enumerate() {
        set_rank(item, i + 1);
    }
    items
}

#[derive(Debug, Clone, Copy)]
pub struct FlowRanker {
    top_n: usize,
}

impl FlowRanker {
    /// `top_n` below one is treated as one.
    pub fn new(top_n: usize) -> Self {
        Self { top_n: top_n.max(1) }
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    pub fn rank(&self, txns: &[CategorizedTransaction]) -> FlowRankings {
        FlowRankings {
            inflow: self.rank_direction(txns, Direction::Inflow),
            outflow: self.rank_direction(txns, Direction::Outflow),
        }
    }

    fn rank_direction(&self, txns: &[CategorizedTransaction], direction: Direction) -> DirectionFlows {
        let selected: Vec<&CategorizedTransaction> =
            txns.iter().filter(|ct| ct.direction() == direction).collect();

        let groups = group_by_merchant(&selected);
        let singles: Vec<RankedFlow> = selected
            .iter()
            .map(|ct| RankedFlow {
                rank: 0,
                transaction_id: ct.transaction.id,
                date: ct.transaction.date,
                label: ct.transaction.merchant_label(),
                category: ct.category.clone(),
                amount: ct.abs_amount(),
            })
            .collect();

        DirectionFlows {
            most_frequent: top(groups.clone(), self.top_n, by_frequency, |g, r| g.rank = r),
            highest_value: top(singles, self.top_n, by_value, |f, r| f.rank = r),
            largest_total: top(groups, self.top_n, by_total, |g, r| g.rank = r),
        }
    }
}

fn group_by_merchant(txns: &[&CategorizedTransaction]) -> Vec<FlowGroup> {
    let mut groups: BTreeMap<String, FlowGroup> = BTreeMap::new();

    for ct in txns {
        let t = &ct.transaction;
        let key = t.merchant_key();
        let group = groups.entry(key.clone()).or_insert_with(|| FlowGroup {
            rank: 0,
            label: t.merchant_label(),
            key,
            count: 0,
            total: Decimal::ZERO,
            first_date: t.date,
            first_id: t.id,
        });
        group.count += 1;
        group.total += t.abs_amount();
        if (t.date, t.id) < (group.first_date, group.first_id) {
            group.first_date = t.date;
            group.first_id = t.id;
            group.label = t.merchant_label();
        }
    }

    groups.into_values().collect()
}
