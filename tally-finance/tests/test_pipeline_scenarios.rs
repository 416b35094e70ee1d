use rust_decimal::Decimal;
use std::str::FromStr;
use tally_core::{AnalysisConfig, Direction, MonthKey, RoundingMode, RuleSpec};
use tally_finance::{InsightPipeline, InsightSummary, Warning};

const SALARY_COFFEE: &str = "\
date,description,amount
2024-01-05,Salary Inc,5000
2024-01-10,Coffee Shop,-4.50
2024-01-10,Coffee Shop,-4.50
";

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn salary_coffee_pipeline(top_n: usize) -> InsightPipeline {
    let mut cfg = AnalysisConfig::with_rules(vec![
        RuleSpec::contains("salary", "Income"),
        RuleSpec::contains("coffee", "Dining"),
    ]);
    cfg.top_n = top_n;
    InsightPipeline::new(cfg).unwrap()
}

fn bucket_total(s: &InsightSummary, month: &str, direction: Direction, category: &str) -> Option<Decimal> {
    let month: MonthKey = month.parse().unwrap();
    s.category_by_month
        .iter()
        .find(|r| r.month == month && r.direction == direction && r.category.as_str() == category)
        .map(|r| r.total)
}

#[test]
fn test_salary_and_coffee_scenario() {
    let s = salary_coffee_pipeline(10).run_csv(SALARY_COFFEE.as_bytes()).unwrap();

    assert_eq!(bucket_total(&s, "2024-01", Direction::Inflow, "Income"), Some(d("5000")));
    let dining = bucket_total(&s, "2024-01", Direction::Outflow, "Dining").unwrap();
    assert_eq!(dining.to_string(), "9.00");

    let top = &s.flows.outflow.most_frequent[0];
    assert_eq!(top.label, "Coffee Shop");
    assert_eq!(top.count, 2);
    assert_eq!(top.rank, 1);

    assert_eq!(s.totals.net.to_string(), "4991.00");
    assert_eq!(s.diagnostics.rejected_count, 0);
    assert!(s.diagnostics.warnings.is_empty());
}

#[test]
fn test_unparseable_amount_is_rejected_and_excluded() {
    let csv = format!("{SALARY_COFFEE}2024-01-11,Coffee Shop,N/A\n");
    let baseline = salary_coffee_pipeline(10).run_csv(SALARY_COFFEE.as_bytes()).unwrap();
    let s = salary_coffee_pipeline(10).run_csv(csv.as_bytes()).unwrap();

    assert_eq!(s.diagnostics.rejected_count, baseline.diagnostics.rejected_count + 1);
    assert_eq!(s.diagnostics.rejected[0].row, 3);
    assert_eq!(s.totals, baseline.totals);
    assert_eq!(s.categories, baseline.categories);
    assert_eq!(s.flows.outflow.most_frequent[0].count, 2);
}

#[test]
fn test_empty_input_gives_empty_summary() {
    let pipeline = salary_coffee_pipeline(10);
    for input in ["", "date,description,amount\n"] {
        let s = pipeline.run_csv(input.as_bytes()).unwrap();
        assert!(s.is_empty());
        assert_eq!(s.totals.inflow, Decimal::ZERO);
        assert_eq!(s.totals.outflow, Decimal::ZERO);
        assert!(s.monthly.is_empty());
        assert!(s.flows.outflow.highest_value.is_empty());
        assert!(matches!(s.diagnostics.warnings[0], Warning::EmptyDataset { .. }));
    }

    let s = pipeline.run_rows(&[]).unwrap();
    assert_eq!(s.diagnostics.rows_read, 0);
}

#[test]
fn test_n_larger_than_available() {
    let s = salary_coffee_pipeline(100).run_csv(SALARY_COFFEE.as_bytes()).unwrap();
    assert_eq!(s.flows.outflow.most_frequent.len(), 1);
    assert_eq!(s.flows.outflow.highest_value.len(), 2);
    assert_ne!(
        s.flows.outflow.highest_value[0].transaction_id,
        s.flows.outflow.highest_value[1].transaction_id
    );
    assert_eq!(s.flows.inflow.highest_value.len(), 1);
}

#[test]
fn test_top_n_truncates() {
    let csv = "\
date,description,amount
2024-02-01,Rent,-1500
2024-02-02,Groceries,-80
2024-02-03,Cinema,-20
2024-02-04,Groceries,-60
";
    let s = salary_coffee_pipeline(2).run_csv(csv.as_bytes()).unwrap();
    let labels: Vec<&str> = s.flows.outflow.highest_value.iter().map(|f| f.label.as_str()).collect();
    assert_eq!(labels, vec!["Rent", "Groceries"]);
    assert_eq!(s.flows.outflow.most_frequent[0].label, "Groceries");
    assert_eq!(s.flows.outflow.most_frequent.len(), 2);
}

#[test]
fn test_json_is_byte_identical_across_runs() {
    let pipeline = InsightPipeline::new(AnalysisConfig::default()).unwrap();
    let first = pipeline.run_csv(SALARY_COFFEE.as_bytes()).unwrap().to_json().unwrap();
    for _ in 0..5 {
        let again = pipeline.run_csv(SALARY_COFFEE.as_bytes()).unwrap().to_json().unwrap();
        assert_eq!(first, again);
    }
}

#[test]
fn test_totals_do_not_depend_on_row_order() {
    let rows = [
        "2024-01-05,Salary Inc,5000",
        "2024-01-10,Coffee Shop,-4.50",
        "2024-02-10,Coffee Shop,-4.50",
        "2024-02-11,Rent,-1200.10",
        "2024-03-01,Refund,19.99",
    ];
    let forward = format!("date,description,amount\n{}\n", rows.join("\n"));
    let mut reversed_rows = rows.to_vec();
    reversed_rows.reverse();
    let reversed = format!("date,description,amount\n{}\n", reversed_rows.join("\n"));

    let pipeline = salary_coffee_pipeline(10);
    let a = pipeline.run_csv(forward.as_bytes()).unwrap();
    let b = pipeline.run_csv(reversed.as_bytes()).unwrap();

    assert_eq!(a.totals, b.totals);
    assert_eq!(a.monthly, b.monthly);
    assert_eq!(a.categories, b.categories);
    assert_eq!(a.category_by_month, b.category_by_month);

    let bucket_sum: Decimal = a
        .category_by_month
        .iter()
        .filter(|r| r.direction == Direction::Outflow)
        .map(|r| r.total)
        .sum();
    let category_sum: Decimal = a.categories.outflow.iter().map(|c| c.total).sum();
    assert_eq!(bucket_sum, a.totals.outflow);
    assert_eq!(category_sum, a.totals.outflow);
}

#[test]
fn test_bank_export_with_debit_credit_columns() {
    let csv = "\
Transaction_Date,Description,Debit_Amount,Credit_Amount,Category,Beneficiary_Name,Transaction_Type
03/01/2024,NEFT ACME CORP SALARY,,\"85,000.00\",Income,ACME Corp,Credit
03/02/2024,UPI/4411/SWIGGY,450.00,,Food,Swiggy,Debit
03/05/2024,UPI/9921/SWIGGY,320.00,,Food,Swiggy,Debit
03/07/2024,Rent March,\"25,000\",,Housing,R Sharma,Debit
03/09/2024,POS 2231 Bookstore,800,,Leisure,,Debit
03/15/2024,Dividend HDFC,,150.50,,,Credit
";
    let s = InsightPipeline::new(AnalysisConfig::default())
        .unwrap()
        .run_csv(csv.as_bytes())
        .unwrap();

    assert_eq!(s.diagnostics.transactions, 6);
    assert_eq!(s.monthly.len(), 1);
    assert_eq!(s.monthly[0].month.to_string(), "2024-03");
    assert_eq!(s.totals.inflow.to_string(), "85150.50");
    assert_eq!(s.totals.outflow.to_string(), "26570.00");

    let inflow: Vec<&str> = s.categories.inflow.iter().map(|c| c.category.as_str()).collect();
    assert_eq!(inflow, vec!["Salary", "Investment Income"]);

    let outflow: Vec<&str> = s.categories.outflow.iter().map(|c| c.category.as_str()).collect();
    // the export's own category fills in where no rule matched
    assert_eq!(outflow, vec!["Housing", "Leisure", "Dining"]);

    let top = &s.flows.outflow.most_frequent[0];
    assert_eq!(top.label, "Swiggy");
    assert_eq!(top.count, 2);
    assert_eq!(top.total.to_string(), "770.00");

    let largest = &s.flows.outflow.largest_total[0];
    assert_eq!(largest.label, "R Sharma");
}

#[test]
fn test_ambiguous_slash_dates_read_month_first() {
    let csv = "\
date,description,amount
01/03/2024,Salary Inc,5000
15/03/2024,Coffee Shop,-4.50
";
    let s = salary_coffee_pipeline(10).run_csv(csv.as_bytes()).unwrap();

    let months: Vec<String> = s.monthly.iter().map(|m| m.month.to_string()).collect();
    // 15/03 has no month-first reading and falls through to day-first
    assert_eq!(months, vec!["2024-01", "2024-03"]);
    assert_eq!(s.monthly[0].inflow.to_string(), "5000.00");
    assert_eq!(s.flows.outflow.highest_value[0].date.to_string(), "2024-03-15");
}

#[test]
fn test_out_of_range_amounts_are_rejected_without_panicking() {
    let csv = "\
date,description,amount
2024-01-05,Salary Inc,5000
2024-01-06,Glitch,79228162514264337593543950335
2024-01-07,Glitch,79228162514264337593543950335
2024-01-08,Glitch,-79228162514264337593543950335
";
    let s = salary_coffee_pipeline(10).run_csv(csv.as_bytes()).unwrap();

    assert_eq!(s.diagnostics.transactions, 1);
    assert_eq!(s.diagnostics.rejected_count, 3);
    let rows: Vec<usize> = s.diagnostics.rejected.iter().map(|r| r.row).collect();
    assert_eq!(rows, vec![1, 2, 3]);
    assert_eq!(s.totals.inflow.to_string(), "5000.00");
    assert!(s.flows.inflow.largest_total.iter().all(|g| g.label != "Glitch"));
}

#[test]
fn test_large_in_range_amounts_sum_exactly() {
    let csv = "\
date,description,amount
2024-01-05,Treasury,1000000000000000
2024-01-06,Treasury,1000000000000000
2024-02-06,Treasury,1000000000000000
";
    let s = salary_coffee_pipeline(10).run_csv(csv.as_bytes()).unwrap();
    assert_eq!(s.diagnostics.rejected_count, 0);
    assert_eq!(s.totals.inflow.to_string(), "3000000000000000.00");
    assert_eq!(s.flows.inflow.largest_total[0].total.to_string(), "3000000000000000.00");
}

#[test]
fn test_presented_figures_add_up_to_presented_totals() {
    // each row is a sub-cent midpoint, so rounding every bucket on its own
    // would lose a cent per bucket
    let csv = "\
date,description,amount
2024-01-05,Bank Fee,-0.125
2024-02-05,Bank Fee,-0.125
2024-03-05,Bank Fee,-0.125
2024-03-06,Interest,0.005
2024-03-07,Interest,0.005
2024-04-07,Interest,0.005
";
    for mode in [RoundingMode::HalfEven, RoundingMode::Truncate] {
        let cfg = AnalysisConfig {
            rounding_mode: mode,
            ..AnalysisConfig::default()
        };
        let s = InsightPipeline::new(cfg).unwrap().run_csv(csv.as_bytes()).unwrap();

        for direction in Direction::ALL {
            let total = match direction {
                Direction::Inflow => s.totals.inflow,
                Direction::Outflow => s.totals.outflow,
            };
            let bucket_sum: Decimal = s
                .category_by_month
                .iter()
                .filter(|r| r.direction == direction)
                .map(|r| r.total)
                .sum();
            let category_sum: Decimal = s.categories.get(direction).iter().map(|c| c.total).sum();
            let month_sum: Decimal = s
                .monthly
                .iter()
                .map(|m| match direction {
                    Direction::Inflow => m.inflow,
                    Direction::Outflow => m.outflow,
                })
                .sum();
            assert_eq!(bucket_sum, total, "{mode:?} {direction:?} buckets");
            assert_eq!(category_sum, total, "{mode:?} {direction:?} categories");
            assert_eq!(month_sum, total, "{mode:?} {direction:?} months");
        }
        let net_sum: Decimal = s.monthly.iter().map(|m| m.net).sum();
        assert_eq!(net_sum, s.totals.net, "{mode:?} net");
    }

    let s = InsightPipeline::new(AnalysisConfig::default())
        .unwrap()
        .run_csv(csv.as_bytes())
        .unwrap();
    assert_eq!(s.totals.outflow.to_string(), "0.38");
    assert_eq!(s.totals.inflow.to_string(), "0.02");
}
