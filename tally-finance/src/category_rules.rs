//! Ordered categorization rules.
//!
//! Rules are plain data ([`RuleSpec`]) compiled once into a [`RuleSet`]. A
//! transaction takes the category of the first rule that matches its
//! description or counterparty; no match falls back to the export's own
//! category column and then to "Uncategorized".

use regex::{Regex, RegexBuilder};
use tracing::debug;

use tally_core::{
    AnalysisConfig, CategorizedTransaction, Category, Direction, Error, MatchType, Result,
    RuleSpec, Transaction,
};

#[derive(Debug, Clone)]
enum Matcher {
    /// Lowercased needle
    Contains(String),
    StartsWith(String),
    Pattern(Regex),
}

impl Matcher {
    fn is_match(&self, text: &str) -> bool {
        match self {
            Matcher::Contains(needle) => text.to_lowercase().contains(needle),
            Matcher::StartsWith(prefix) => text.trim_start().to_lowercase().starts_with(prefix),
            Matcher::Pattern(re) => re.is_match(text),
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledRule {
    matcher: Matcher,
    category: Category,
    direction: Option<Direction>,
}

fn case_insensitive(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

fn compile_rule(index: usize, spec: &RuleSpec) -> Result<CompiledRule> {
    let invalid = |reason: String| Error::InvalidRule { index, reason };

    let pattern = spec.pattern.trim();
    if pattern.is_empty() {
        return Err(invalid("empty pattern".to_string()));
    }
    let category = spec.category.trim();
    if category.is_empty() {
        return Err(invalid("empty category".to_string()));
    }

    let matcher = match spec.match_type {
        MatchType::Contains => Matcher::Contains(pattern.to_lowercase()),
        MatchType::StartsWith => Matcher::StartsWith(pattern.to_lowercase()),
        MatchType::Regex => {
            Matcher::Pattern(case_insensitive(pattern).map_err(|e| invalid(e.to_string()))?)
        }
        MatchType::Keywords => {
            let words: Vec<String> = pattern
                .split(['|', ','])
                .map(str::trim)
                .filter(|w| !w.is_empty())
                .map(|w| {
                    // multi-word keywords tolerate any run of whitespace
                    w.split_whitespace()
                        .map(regex::escape)
                        .collect::<Vec<_>>()
                        .join(r"\s+")
                })
                .collect();
            if words.is_empty() {
                return Err(invalid("no keywords".to_string()));
            }
            let re = format!(r"\b(?:{})\b", words.join("|"));
            Matcher::Pattern(case_insensitive(&re).map_err(|e| invalid(e.to_string()))?)
        }
    };

    Ok(CompiledRule {
        matcher,
        category: Category::new(category),
        direction: spec.direction,
    })
}

/// A validated, ordered rule list
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    /// Compile rules in priority order. The first invalid rule is reported
    /// with its position.
    pub fn compile(specs: &[RuleSpec]) -> Result<Self> {
        let rules = specs
            .iter()
            .enumerate()
            .map(|(i, spec)| compile_rule(i, spec))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Append `other`'s rules at lower priority.
    pub fn extend(&mut self, other: RuleSet) {
        self.rules.extend(other.rules);
    }

    /// Category of the first matching rule, if any
    pub fn find(&self, txn: &Transaction) -> Option<&Category> {
        let direction = txn.direction();
        let counterparty = txn
            .counterparty
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        self.rules
            .iter()
            .filter(|r| r.direction.is_none_or(|d| d == direction))
            .find(|r| {
                r.matcher.is_match(&txn.description)
                    || counterparty.is_some_and(|c| r.matcher.is_match(c))
            })
            .map(|r| &r.category)
    }
}

/// Built-in rules covering common bank-statement income and spending lines
pub fn default_rules() -> Vec<RuleSpec> {
    use Direction::{Inflow, Outflow};

    vec![
        // income
        RuleSpec::keywords(&["salary", "payroll", "wages", "sal cr"], "Salary").for_direction(Inflow),
        RuleSpec::keywords(&["freelance", "upwork", "fiverr", "consulting", "invoice"], "Freelance")
            .for_direction(Inflow),
        RuleSpec::keywords(&["dividend", "div", "capital gain"], "Investment Income")
            .for_direction(Inflow),
        RuleSpec::keywords(&["interest", "int cr", "int pd"], "Interest").for_direction(Inflow),
        RuleSpec::keywords(&["refund", "reversal", "cashback", "chargeback"], "Refunds")
            .for_direction(Inflow),
        // spending
        RuleSpec::keywords(&["rent", "landlord", "lease", "society maintenance"], "Housing")
            .for_direction(Outflow),
        RuleSpec::keywords(&["emi", "loan", "mortgage", "home loan", "car loan"], "Loan EMI")
            .for_direction(Outflow),
        RuleSpec::keywords(
            &["mutual fund", "sip", "zerodha", "groww", "vanguard", "fidelity", "brokerage", "ppf"],
            "Investments",
        )
        .for_direction(Outflow),
        RuleSpec::keywords(
            &["electricity", "water bill", "gas bill", "broadband", "internet", "recharge", "airtel", "jio", "utility"],
            "Utilities",
        )
        .for_direction(Outflow),
        RuleSpec::keywords(
            &["grocery", "groceries", "supermarket", "bigbasket", "blinkit", "dmart", "walmart", "costco", "whole foods"],
            "Groceries",
        )
        .for_direction(Outflow),
        RuleSpec::keywords(
            &["restaurant", "cafe", "coffee", "swiggy", "zomato", "starbucks", "pizza", "dining"],
            "Dining",
        )
        .for_direction(Outflow),
        RuleSpec::keywords(&["amazon", "flipkart", "myntra", "ajio", "mall", "shopping"], "Shopping")
            .for_direction(Outflow),
        RuleSpec::keywords(
            &["uber", "ola", "lyft", "fuel", "petrol", "diesel", "metro", "taxi", "parking", "irctc"],
            "Transport",
        )
        .for_direction(Outflow),
        RuleSpec::keywords(
            &["netflix", "spotify", "prime video", "hotstar", "youtube", "subscription", "icloud"],
            "Subscriptions",
        )
        .for_direction(Outflow),
        RuleSpec::keywords(&["insurance", "premium", "lic", "policy"], "Insurance")
            .for_direction(Outflow),
        RuleSpec::keywords(
            &["pharmacy", "hospital", "clinic", "medical", "doctor", "apollo", "diagnostics"],
            "Healthcare",
        )
        .for_direction(Outflow),
        RuleSpec::keywords(&["atm", "cash withdrawal", "cash wdl"], "Cash Withdrawal")
            .for_direction(Outflow),
        RuleSpec::keywords(&["transfer", "neft", "imps", "rtgs"], "Transfers"),
    ]
}

/// Assigns exactly one category to each transaction
#[derive(Debug, Clone)]
pub struct Categorizer {
    rules: RuleSet,
    use_source_category: bool,
}

impl Categorizer {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            use_source_category: false,
        }
    }

    /// Caller rules first, then the built-in set when enabled.
    pub fn from_config(config: &AnalysisConfig) -> Result<Self> {
        let mut rules = RuleSet::compile(&config.rules)?;
        if config.use_default_rules {
            rules.extend(RuleSet::compile(&default_rules())?);
        }
        debug!("Compiled {} categorization rules", rules.len());
        Ok(Self {
            rules,
            use_source_category: config.use_source_category,
        })
    }

    pub fn with_source_category(mut self, enabled: bool) -> Self {
        self.use_source_category = enabled;
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn categorize(&self, txn: &Transaction) -> Category {
        if let Some(category) = self.rules.find(txn) {
            return category.clone();
        }
        if self.use_source_category {
            if let Some(source) = txn
                .source_category
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
            {
                return Category::new(source);
            }
        }
        Category::uncategorized()
    }

    pub fn categorize_all(&self, txns: Vec<Transaction>) -> Vec<CategorizedTransaction> {
        let out: Vec<CategorizedTransaction> = txns
            .into_iter()
            .map(|t| {
                let category = self.categorize(&t);
                CategorizedTransaction::new(t, category)
            })
            .collect();
        debug!(
            "Categorized {} transactions ({} uncategorized)",
            out.len(),
            out.iter().filter(|c| c.category.is_uncategorized()).count()
        );
        out
    }
}
