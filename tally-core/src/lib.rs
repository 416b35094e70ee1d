//! tally-core: shared types for the transaction analysis pipeline

pub mod config;
pub mod error;
pub mod money;
pub mod period;
pub mod transaction;

pub use config::{
    AmountSign, AnalysisConfig, ColumnMapping, LogicalField, MatchType, RuleSpec,
    DEFAULT_DATE_FORMATS, DEFAULT_TOP_N,
};
pub use error::{Error, Result};
pub use money::{money, RoundingMode, MONEY_DP, SHARE_DP};
pub use period::MonthKey;
pub use transaction::{CategorizedTransaction, Category, Direction, Transaction};
