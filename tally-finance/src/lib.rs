//! tally-finance: categorization rules, monthly aggregation, flow rankings
//! and the insight summary, tied together by [`InsightPipeline`].

pub mod aggregator;
pub mod category_rules;
pub mod flow_ranker;
pub mod pipeline;
pub mod summary;

pub use aggregator::{Aggregation, Aggregator, BucketKey, CategoryTotal, FlowTotals, MonthlyBucket};
pub use category_rules::{default_rules, Categorizer, RuleSet};
pub use flow_ranker::{DirectionFlows, FlowGroup, FlowRanker, FlowRankings, RankedFlow};
pub use pipeline::InsightPipeline;
pub use summary::{Diagnostics, InsightSummary, SummaryBuilder, Warning};
