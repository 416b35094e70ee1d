//! Plain-text report tables for the terminal.

use std::fmt::Write;

use tally_core::{money, Direction};
use tally_finance::summary::{GroupRow, InsightSummary};

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let cut: String = s.chars().take(width.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

fn group_table(out: &mut String, title: &str, rows: &[GroupRow]) {
    let _ = writeln!(out, "{title}");
    if rows.is_empty() {
        let _ = writeln!(out, "  (none)");
        return;
    }
    for r in rows {
        let _ = writeln!(
            out,
            "  {:>2}. {:<32} {:>5}x {:>14}",
            r.rank,
            truncate(&r.label, 32),
            r.count,
            money(r.total)
        );
    }
}

pub fn render_summary(s: &InsightSummary) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# Monthly income vs spending\n");
    let _ = writeln!(out, "  {:<10} {:>14} {:>14} {:>14}", "Month", "Income", "Spending", "Net");
    for m in &s.monthly {
        let _ = writeln!(
            out,
            "  {:<10} {:>14} {:>14} {:>14}",
            m.label,
            money(m.inflow),
            money(m.outflow),
            money(m.net)
        );
    }
    let _ = writeln!(
        out,
        "  {:<10} {:>14} {:>14} {:>14}\n",
        "Total",
        money(s.totals.inflow),
        money(s.totals.outflow),
        money(s.totals.net)
    );

    for direction in Direction::ALL {
        let _ = writeln!(out, "# {} by category\n", direction.heading());
        let rows = s.categories.get(direction);
        if rows.is_empty() {
            let _ = writeln!(out, "  (none)");
        }
        for c in rows {
            let _ = writeln!(
                out,
                "  {:<24} {:>14} {:>6}% {:>5} txns",
                truncate(c.category.as_str(), 24),
                money(c.total),
                c.share,
                c.count
            );
        }
        let _ = writeln!(out);
    }

    for direction in [Direction::Outflow, Direction::Inflow] {
        let flows = s.flows.get(direction);
        let noun = match direction {
            Direction::Inflow => "inflows",
            Direction::Outflow => "outflows",
        };
        let _ = writeln!(out, "# Top {noun}\n");
        group_table(&mut out, "Largest total", &flows.largest_total);
        group_table(&mut out, "Most frequent", &flows.most_frequent);
        let _ = writeln!(out, "Highest value");
        if flows.highest_value.is_empty() {
            let _ = writeln!(out, "  (none)");
        }
        for f in &flows.highest_value {
            let _ = writeln!(
                out,
                "  {:>2}. {} {:<32} {:>14}  {}",
                f.rank,
                f.date,
                truncate(&f.label, 32),
                money(f.amount),
                f.category
            );
        }
        let _ = writeln!(out);
    }

    let d = &s.diagnostics;
    let _ = writeln!(out, "# Diagnostics\n");
    let _ = writeln!(
        out,
        "  rows read: {}  transactions: {}  rejected: {}  zero-amount: {}  uncategorized: {}",
        d.rows_read, d.transactions, d.rejected_count, d.dropped_zero, d.uncategorized_count
    );
    for r in &d.rejected {
        let _ = writeln!(out, "  row {}: {}", r.row, r.reason);
    }
    for w in &d.warnings {
        let _ = writeln!(out, "  warning: {w}");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::AnalysisConfig;
    use tally_finance::InsightPipeline;

    #[test]
    fn test_render_contains_each_section() {
        let csv = "date,description,amount\n2024-01-05,Salary,85000\n2024-01-10,Coffee Shop,-4.50\n2024-01-11,Cafe,oops\n";
        let s = InsightPipeline::new(AnalysisConfig::default())
            .unwrap()
            .run_csv(csv.as_bytes())
            .unwrap();
        let text = render_summary(&s);

        assert!(text.contains("Jan 2024"));
        assert!(text.contains("85,000.00"));
        assert!(text.contains("# Spending by category"));
        assert!(text.contains("Coffee Shop"));
        assert!(text.contains("row 2: unparseable amount 'oops'"));
    }

    #[test]
    fn test_truncate_long_labels() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 5), "abcd…");
    }
}
