//! Prompt for the AI-written financial report.
//!
//! The model only sees the serialized summary, never the uploaded rows.

use anyhow::Result;
use tally_finance::InsightSummary;

pub const SYSTEM_PROMPT: &str = "You are an expert financial analyst. \
You write clear, professional reports in Markdown for the account holder.";

/// Report sections, in order, with what each should cover
pub const REPORT_SECTIONS: &[(&str, &str)] = &[
    (
        "Overall Financial Summary",
        "A brief overview of financial health: key trends in income, spending and savings.",
    ),
    (
        "Income Analysis",
        "Primary and secondary income sources (salary, freelance, investments) and how stable and frequent they are.",
    ),
    (
        "Spending Habits Analysis",
        "The major spending categories, the top 3-5 by amount, and notable discretionary patterns.",
    ),
    (
        "Loan and Debt Analysis",
        "Loan repayments (EMIs), the loan type where it can be told, and the share of income going to debt.",
    ),
    (
        "Investment & Savings",
        "Investments such as mutual fund SIPs or fixed deposits, and an assessment of saving discipline.",
    ),
    (
        "Actionable Recommendations",
        "3-5 clear, actionable recommendations: budgeting tips, saving strategies or debt management advice.",
    ),
];

pub fn build_prompt(summary: &InsightSummary) -> Result<String> {
    let json = summary.to_json_pretty()?;

    let mut out = String::new();
    out.push_str(
        "Write a detailed financial insight report from the transaction summary below. \
Amounts are exact decimal strings in the statement's currency. \
Inflows are income, outflows are spending.\n\n",
    );
    out.push_str("## Summary data\n\n```json\n");
    out.push_str(&json);
    out.push_str("\n```\n\n## Instructions\n\n");
    out.push_str("Use one Markdown header per section, in this order:\n\n");
    for (i, (title, what)) in REPORT_SECTIONS.iter().enumerate() {
        out.push_str(&format!("{}. **{}:** {}\n", i + 1, title, what));
    }
    if summary.is_empty() {
        out.push_str("\nThe statement contained no valid transactions; say so plainly instead of guessing.\n");
    } else if summary.diagnostics.rejected_count > 0 {
        out.push_str(&format!(
            "\n{} rows could not be read and are excluded from every figure.\n",
            summary.diagnostics.rejected_count
        ));
    }
    out.push_str("\nBe insightful and professional.\n");
    Ok(out)
}
