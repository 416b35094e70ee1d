//! End-to-end analysis run: parse, categorize, aggregate, rank, summarize.

use std::io::Read;
use tracing::{debug, info};

use tally_core::{AnalysisConfig, Result};
use tally_ingest::{ParsedStatement, RawRow, StatementParser};

use crate::aggregator::Aggregator;
use crate::category_rules::Categorizer;
use crate::flow_ranker::FlowRanker;
use crate::summary::{Diagnostics, InsightSummary, SummaryBuilder};

/// A configured pipeline. Immutable; each run owns its own data, so one
/// instance can serve many runs, from many threads.
#[derive(Debug, Clone)]
pub struct InsightPipeline {
    parser: StatementParser,
    categorizer: Categorizer,
    ranker: FlowRanker,
    builder: SummaryBuilder,
}

impl InsightPipeline {
    /// Validate the config and compile its rules.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            parser: StatementParser::from_config(&config),
            categorizer: Categorizer::from_config(&config)?,
            ranker: FlowRanker::new(config.top_n),
            builder: SummaryBuilder::new(config.rounding_mode),
        })
    }

    pub fn categorizer(&self) -> &Categorizer {
        &self.categorizer
    }

    pub fn run_rows(&self, rows: &[RawRow]) -> Result<InsightSummary> {
        let parsed = self.parser.parse_rows(rows)?;
        Ok(self.analyze(parsed))
    }

    pub fn run_csv<R: Read>(&self, reader: R) -> Result<InsightSummary> {
        let parsed = self.parser.parse_csv(reader)?;
        Ok(self.analyze(parsed))
    }

    /// Everything after parsing. Infallible: bad rows were already set aside.
    pub fn analyze(&self, parsed: ParsedStatement) -> InsightSummary {
        let ParsedStatement {
            rows_read,
            transactions,
            rejected,
            dropped_zero,
        } = parsed;

        let categorized = self.categorizer.categorize_all(transactions);
        let uncategorized = categorized
            .iter()
            .filter(|c| c.category.is_uncategorized())
            .count();

        let agg = Aggregator::aggregate(&categorized);
        let flows = self.ranker.rank(&categorized);
        debug!(
            "Ranked flows (top {}): {} outflow merchants, {} inflow merchants",
            self.ranker.top_n(),
            flows.outflow.most_frequent.len(),
            flows.inflow.most_frequent.len()
        );

        let diagnostics = Diagnostics::new(
            rows_read,
            categorized.len(),
            rejected,
            dropped_zero,
            uncategorized,
        );
        let summary = self.builder.build(&agg, &flows, diagnostics);

        info!(
            "Analyzed {} rows: {} transactions, {} rejected, {} uncategorized, {} months",
            rows_read,
            summary.diagnostics.transactions,
            summary.diagnostics.rejected_count,
            uncategorized,
            summary.monthly.len()
        );
        summary
    }
}
