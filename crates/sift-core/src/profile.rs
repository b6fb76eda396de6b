//! Descriptive statistics over a loaded statement
//!
//! Quartiles use linear interpolation between closest ranks
//! (`h = (n - 1) * q`), the same method NumPy and pandas use by default.
//! Standard deviation is the sample form (denominator `n - 1`). Aggregates
//! that are undefined for the data at hand are `None`, never NaN.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{TransactionTable, Value};

/// Summary statistics for one numeric column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub column: String,
    /// Non-null values
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

/// Null cells in one column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingCount {
    pub column: String,
    pub missing: usize,
}

/// The Summary Record: everything the report and the prompt say about the data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub row_count: usize,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Sum of money out, as a positive number
    pub total_debit: f64,
    /// Sum of money in
    pub total_credit: f64,
    /// Rows dropped at load time for an unparseable date
    pub skipped_rows: usize,
    /// One entry per source column, in file order
    pub missing: Vec<MissingCount>,
    /// One entry per numeric column, in file order
    pub stats: Vec<ColumnStats>,
}

impl Summary {
    pub fn missing_for(&self, column: &str) -> Option<usize> {
        self.missing
            .iter()
            .find(|m| m.column == column)
            .map(|m| m.missing)
    }

    pub fn stats_for(&self, column: &str) -> Option<&ColumnStats> {
        self.stats.iter().find(|s| s.column == column)
    }

    pub fn total_missing(&self) -> usize {
        self.missing.iter().map(|m| m.missing).sum()
    }
}

/// Compute the Summary Record for a table
pub fn profile(table: &TransactionTable) -> Summary {
    let mut missing = Vec::with_capacity(table.headers.len());
    let mut stats = Vec::new();

    for (index, header) in table.headers.iter().enumerate() {
        if let Some(role) = table.columns.role_at(index) {
            let nulls = table
                .transactions
                .iter()
                .filter(|t| t.is_missing(role))
                .count();
            missing.push(MissingCount {
                column: header.clone(),
                missing: nulls,
            });

            if role.is_numeric() {
                let values: Vec<f64> = table
                    .transactions
                    .iter()
                    .filter_map(|t| t.number(role))
                    .collect();
                stats.push(describe(header, &values));
            }
            continue;
        }

        let Some(pos) = table.extra_columns.iter().position(|c| c.index == index) else {
            continue;
        };
        let cells = table.transactions.iter().map(|t| t.extras.get(pos).and_then(Option::as_ref));

        missing.push(MissingCount {
            column: header.clone(),
            missing: cells.clone().filter(Option::is_none).count(),
        });

        if table.extra_columns[pos].numeric {
            let values: Vec<f64> = cells
                .filter_map(|cell| match cell {
                    Some(Value::Number(n)) => Some(*n),
                    _ => None,
                })
                .collect();
            stats.push(describe(header, &values));
        }
    }

    let (start_date, end_date) = match table.date_range() {
        Some((start, end)) => (Some(start), Some(end)),
        None => (None, None),
    };

    Summary {
        row_count: table.len(),
        start_date,
        end_date,
        total_debit: table.total_debit(),
        total_credit: table.total_credit(),
        skipped_rows: table.skipped_rows,
        missing,
        stats,
    }
}

/// Summary statistics for a set of non-null values
pub fn describe(column: &str, values: &[f64]) -> ColumnStats {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    ColumnStats {
        column: column.to_string(),
        count: sorted.len(),
        mean: mean(&sorted),
        std: sample_std(&sorted),
        min: sorted.first().copied(),
        q25: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q75: quantile(&sorted, 0.75),
        max: sorted.last().copied(),
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation; undefined for fewer than two values
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Quantile of already-sorted values by linear interpolation
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    Some(sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{load_reader, LoaderOptions};

    const EPS: f64 = 1e-9;

    fn load(csv: &str) -> TransactionTable {
        load_reader(csv.as_bytes(), &LoaderOptions::default()).unwrap()
    }

    #[test]
    fn test_quartiles_one_to_ten() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        let stats = describe("x", &values);
        assert!((stats.q25.unwrap() - 3.25).abs() < EPS);
        assert!((stats.median.unwrap() - 5.5).abs() < EPS);
        assert!((stats.q75.unwrap() - 7.75).abs() < EPS);
        assert_eq!(stats.min, Some(1.0));
        assert_eq!(stats.max, Some(10.0));
        assert_eq!(stats.mean, Some(5.5));
    }

    #[test]
    fn test_quantile_is_order_independent() {
        let stats = describe("x", &[9.0, 1.0, 5.0, 3.0, 7.0]);
        assert_eq!(stats.median, Some(5.0));
        assert_eq!(stats.q25, Some(3.0));
        assert_eq!(stats.q75, Some(7.0));
    }

    #[test]
    fn test_sample_std_matches_reference() {
        // Reference: numpy.std([2, 4, 4, 4, 5, 5, 7, 9], ddof=1) = 2.138089935299395
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let std = sample_std(&values).unwrap();
        assert!((std - 2.138089935299395).abs() < 1e-6);
    }

    #[test]
    fn test_std_non_negative_for_constant_column() {
        assert_eq!(sample_std(&[3.0, 3.0, 3.0]), Some(0.0));
    }

    #[test]
    fn test_single_value_has_undefined_std() {
        let stats = describe("x", &[42.0]);
        assert_eq!(stats.count, 1);
        assert_eq!(stats.std, None);
        assert_eq!(stats.median, Some(42.0));
    }

    #[test]
    fn test_empty_column_is_all_undefined() {
        let stats = describe("x", &[]);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.mean, None);
        assert_eq!(stats.std, None);
        assert_eq!(stats.min, None);
        assert_eq!(stats.q25, None);
        assert_eq!(stats.median, None);
        assert_eq!(stats.q75, None);
        assert_eq!(stats.max, None);
    }

    #[test]
    fn test_missing_counts_with_known_nulls() {
        // 10 rows, 3 blank debit cells
        let mut csv = String::from("Transaction Date,Debit Amount,Credit Amount\n");
        for day in 1..=10 {
            let debit = if [2, 5, 9].contains(&day) {
                String::new()
            } else {
                format!("{}.00", day)
            };
            csv.push_str(&format!("{:02}/01/2025,{},1.00\n", day, debit));
        }

        let summary = profile(&load(&csv));
        assert_eq!(summary.row_count, 10);
        assert_eq!(summary.missing_for("Debit Amount"), Some(3));
        assert_eq!(summary.missing_for("Credit Amount"), Some(0));
        assert_eq!(summary.missing_for("Transaction Date"), Some(0));
        assert_eq!(summary.stats_for("Debit Amount").unwrap().count, 7);
    }

    #[test]
    fn test_profile_all_columns_present() {
        let csv = "Transaction Date,Transaction Type,Transaction Description,Debit Amount,Credit Amount,Balance,Category
02/01/2025,DEB,TESCO,10.00,0.00,990.00,Groceries
03/01/2025,FPI,SALARY,0.00,2000.00,2990.00,Income
04/01/2025,DEB,COSTA,3.50,0.00,2986.50,Eating Out
05/01/2025,DD,GAS,45.00,0.00,2941.50,Bills
06/01/2025,DEB,TESCO,21.50,0.00,2920.00,Groceries";

        let summary = profile(&load(csv));
        assert_eq!(summary.row_count, 5);
        assert_eq!(summary.total_missing(), 0);
        assert_eq!(summary.missing.len(), 7);
        assert_eq!(
            summary.start_date,
            NaiveDate::from_ymd_opt(2025, 1, 2)
        );
        assert_eq!(summary.end_date, NaiveDate::from_ymd_opt(2025, 1, 6));
        assert!((summary.total_debit - 80.0).abs() < EPS);
        assert!((summary.total_credit - 2000.0).abs() < EPS);

        let stat_columns: Vec<_> = summary.stats.iter().map(|s| s.column.as_str()).collect();
        assert_eq!(stat_columns, ["Debit Amount", "Credit Amount", "Balance"]);
    }

    #[test]
    fn test_numeric_extra_column_gets_stats() {
        let csv = "Date,Amount,Reference,Fee\n2025-01-02,-5.00,ABC,0.10\n2025-01-03,7.00,,0.30\n";
        let summary = profile(&load(csv));

        assert_eq!(summary.missing_for("Reference"), Some(1));
        assert!(summary.stats_for("Reference").is_none());
        let fee = summary.stats_for("Fee").unwrap();
        assert_eq!(fee.count, 2);
        assert!((fee.mean.unwrap() - 0.2).abs() < EPS);
    }

    #[test]
    fn test_summary_serializes_to_json() {
        let summary = profile(&load("Date,Amount\n2025-01-02,-5.00\n"));
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["row_count"], 1);
        assert_eq!(json["start_date"], "2025-01-02");
        assert!(json["stats"][0]["std"].is_null());
    }
}
