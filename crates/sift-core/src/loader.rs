//! CSV loader for bank statement exports
//!
//! Columns are not fixed: each header is matched case-insensitively against
//! the aliases of every `ColumnRole` and bound once, up front. Rows are then
//! coerced into typed `Transaction` records.
//!
//! Blank or unparseable numeric cells become `None` (never zero), so the
//! profiler's missing-value counts reflect what the bank actually left empty.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::models::{ColumnMap, ColumnRole, ExtraColumn, Transaction, TransactionTable, Value};

/// Symbols stripped from amounts before parsing
const CURRENCY_SYMBOLS: [char; 4] = ['£', '$', '€', '¥'];

/// Numeric convention used by the export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberFormat {
    pub decimal_separator: char,
    pub thousands_separator: Option<char>,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            decimal_separator: '.',
            thousands_separator: Some(','),
        }
    }
}

impl NumberFormat {
    /// Parse an amount string, handling currency symbols, grouping and `(x)` negatives
    ///
    /// Returns None for blank or unparseable cells.
    pub fn parse(&self, raw: &str) -> Option<f64> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        let (negative, body) = match trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
            Some(inner) => (true, inner),
            None => (false, trimmed),
        };

        let mut cleaned = String::with_capacity(body.len());
        for c in body.chars() {
            if c.is_whitespace() || CURRENCY_SYMBOLS.contains(&c) || Some(c) == self.thousands_separator
            {
                continue;
            }
            if c == self.decimal_separator {
                cleaned.push('.');
            } else {
                cleaned.push(c);
            }
        }

        let value = cleaned.parse::<f64>().ok().filter(|v| v.is_finite())?;
        Some(if negative { -value } else { value })
    }
}

/// Options controlling how a statement file is read
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    pub delimiter: u8,
    pub number_format: NumberFormat,
    /// chrono formats, tried in order
    pub date_formats: Vec<String>,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            number_format: NumberFormat::default(),
            date_formats: vec![
                "%d/%m/%Y".to_string(),
                "%Y-%m-%d".to_string(),
                "%d-%m-%Y".to_string(),
                "%d/%m/%y".to_string(),
                "%m/%d/%Y".to_string(),
                "%Y/%m/%d".to_string(),
            ],
        }
    }
}

/// Load a statement file into a `TransactionTable`
pub fn load_file(path: &Path, opts: &LoaderOptions) -> Result<TransactionTable> {
    let file = File::open(path).map_err(|e| Error::load(path, e.to_string()))?;
    let mut table = load_reader(file, opts).map_err(|e| match e {
        Error::Load { reason, .. } => Error::load(path, reason),
        other => Error::load(path, other.to_string()),
    })?;
    table.source = path.to_path_buf();

    info!(
        path = %path.display(),
        rows = table.len(),
        skipped = table.skipped_rows,
        "Loaded transactions"
    );
    Ok(table)
}

/// Load statement data from any reader
pub fn load_reader<R: Read>(reader: R, opts: &LoaderOptions) -> Result<TransactionTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .delimiter(opts.delimiter)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let columns = resolve_columns(&headers);
    let date_idx = columns
        .index(ColumnRole::Date)
        .ok_or_else(|| Error::load("", "no date-like column found in header"))?;
    if !columns.has_amount() {
        return Err(Error::load(
            "",
            "no amount-like column (debit, credit or amount) found in header",
        ));
    }

    for role in ColumnRole::all() {
        match columns.get(*role) {
            Some(col) => debug!(role = %role, column = %col.header, "Resolved column"),
            None => debug!(role = %role, "Column not present"),
        }
    }

    let extra_indices: Vec<usize> = (0..headers.len())
        .filter(|i| columns.role_at(*i).is_none())
        .collect();

    // First pass: keep rows with a usable date, remember raw extra cells
    let mut rows: Vec<(Transaction, Vec<Option<String>>)> = Vec::new();
    let mut skipped_rows = 0;
    let mut unparsed_amounts = 0;

    for (line, result) in rdr.records().enumerate() {
        let record = result?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }

        let date_cell = record.get(date_idx).unwrap_or("");
        let Some(date) = parse_date(date_cell, &opts.date_formats) else {
            debug!(row = line + 2, value = %date_cell, "Dropping row with unparseable date");
            skipped_rows += 1;
            continue;
        };

        let mut number = |role: ColumnRole| -> Option<f64> {
            let cell = columns.index(role).and_then(|i| record.get(i))?;
            let parsed = opts.number_format.parse(cell);
            if parsed.is_none() && !cell.is_empty() {
                debug!(row = line + 2, column = %role, value = %cell, "Unparseable amount");
                unparsed_amounts += 1;
            }
            parsed
        };

        let debit = number(ColumnRole::Debit);
        let credit = number(ColumnRole::Credit);
        let amount = number(ColumnRole::Amount);
        let balance = number(ColumnRole::Balance);

        let transaction = Transaction {
            date,
            kind: text_cell(&record, &columns, ColumnRole::Type),
            description: text_cell(&record, &columns, ColumnRole::Description),
            debit,
            credit,
            amount,
            balance,
            category: text_cell(&record, &columns, ColumnRole::Category),
            extras: Vec::new(),
        };

        let raw_extras = extra_indices
            .iter()
            .map(|i| record.get(*i).filter(|s| !s.is_empty()).map(str::to_string))
            .collect();

        rows.push((transaction, raw_extras));
    }

    if skipped_rows > 0 {
        warn!(
            skipped = skipped_rows,
            "Some dates could not be parsed; those rows were dropped"
        );
    }
    if unparsed_amounts > 0 {
        warn!(
            cells = unparsed_amounts,
            "Some amounts could not be parsed; they are treated as missing"
        );
    }
    if rows.is_empty() {
        return Err(Error::load("", "file contains no parsable rows"));
    }

    // Second pass: an extra column is numeric when every non-empty cell parses
    let extra_columns: Vec<ExtraColumn> = extra_indices
        .iter()
        .enumerate()
        .map(|(pos, &index)| {
            let mut cells = rows.iter().filter_map(|(_, extras)| extras[pos].as_deref());
            let mut any = false;
            let numeric = cells.all(|cell| {
                any = true;
                opts.number_format.parse(cell).is_some()
            }) && any;
            ExtraColumn {
                index,
                header: headers[index].clone(),
                numeric,
            }
        })
        .collect();

    let transactions = rows
        .into_iter()
        .map(|(mut transaction, raw)| {
            transaction.extras = raw
                .into_iter()
                .zip(&extra_columns)
                .map(|(cell, column)| {
                    cell.map(|s| match column.numeric {
                        true => opts
                            .number_format
                            .parse(&s)
                            .map(Value::Number)
                            .unwrap_or(Value::Text(s)),
                        false => Value::Text(s),
                    })
                })
                .collect();
            transaction
        })
        .collect();

    Ok(TransactionTable {
        source: Default::default(),
        headers,
        columns,
        extra_columns,
        transactions,
        skipped_rows,
    })
}

/// Bind header columns to roles by case-insensitive alias matching
///
/// Each header matches the first role (in `ColumnRole::all()` order) whose
/// alias it contains, and binds to it only if that role is still free. A
/// second `... Date` column stays an extra column rather than falling through
/// to a later role.
pub fn resolve_columns(headers: &[String]) -> ColumnMap {
    let mut columns = ColumnMap::new();

    for (index, header) in headers.iter().enumerate() {
        let lower = header.to_lowercase();
        let matched = ColumnRole::all()
            .iter()
            .find(|role| role.aliases().iter().any(|alias| lower.contains(alias)));

        match matched {
            Some(role) if !columns.has(*role) => {
                columns.bind(*role, index, header);
            }
            Some(role) => {
                debug!(column = %header, role = %role, "Role already bound; keeping as extra column");
            }
            None => {}
        }
    }

    columns
}

fn text_cell(record: &StringRecord, columns: &ColumnMap, role: ColumnRole) -> Option<String> {
    columns
        .index(role)
        .and_then(|i| record.get(i))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse a date string with the configured formats
///
/// Falls back to a date-time form (`2025-01-02 09:30:00`) for exports that
/// include a time of day.
pub fn parse_date(s: &str, formats: &[String]) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }

    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(csv: &str) -> Result<TransactionTable> {
        load_reader(csv.as_bytes(), &LoaderOptions::default())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    const LLOYDS_STYLE: &str = "Transaction Date,Transaction Type,Sort Code,Account Number,Transaction Description,Debit Amount,Credit Amount,Balance,Category
02/01/2025,DEB,'11-22-33,12345678,TESCO STORES,23.40,,976.60,Groceries
03/01/2025,FPI,'11-22-33,12345678,SALARY ACME LTD,,\"2,150.00\",\"3,126.60\",Income
05/01/2025,DD,'11-22-33,12345678,COUNCIL TAX,142.00,,\"2,984.60\",Bills
07/01/2025,DEB,'11-22-33,12345678,COSTA COFFEE,3.10,,\"2,981.50\",Eating Out
09/01/2025,SO,'11-22-33,12345678,RENT,950.00,,\"2,031.50\",Housing";

    #[test]
    fn test_parse_amount() {
        let fmt = NumberFormat::default();
        assert_eq!(fmt.parse("£1,234.56"), Some(1234.56));
        assert_eq!(fmt.parse("-123.45"), Some(-123.45));
        assert_eq!(fmt.parse("(100.00)"), Some(-100.00));
        assert_eq!(fmt.parse("$ 12"), Some(12.0));
        assert_eq!(fmt.parse(""), None);
        assert_eq!(fmt.parse("n/a"), None);
    }

    #[test]
    fn test_parse_amount_decimal_comma() {
        let fmt = NumberFormat {
            decimal_separator: ',',
            thousands_separator: Some('.'),
        };
        assert_eq!(fmt.parse("1.234,56"), Some(1234.56));
        assert_eq!(fmt.parse("€ 0,99"), Some(0.99));
    }

    #[test]
    fn test_parse_date_formats() {
        let formats = LoaderOptions::default().date_formats;
        assert_eq!(parse_date("02/01/2025", &formats), Some(date(2025, 1, 2)));
        assert_eq!(parse_date("2025-01-02", &formats), Some(date(2025, 1, 2)));
        assert_eq!(
            parse_date("2025-01-02 09:30:00", &formats),
            Some(date(2025, 1, 2))
        );
        assert_eq!(parse_date("yesterday", &formats), None);
        assert_eq!(parse_date("", &formats), None);
    }

    #[test]
    fn test_resolve_columns_by_alias() {
        let headers: Vec<String> = LLOYDS_STYLE
            .lines()
            .next()
            .unwrap()
            .split(',')
            .map(str::to_string)
            .collect();
        let columns = resolve_columns(&headers);

        assert_eq!(columns.header(ColumnRole::Date), Some("Transaction Date"));
        assert_eq!(columns.header(ColumnRole::Type), Some("Transaction Type"));
        assert_eq!(columns.header(ColumnRole::Debit), Some("Debit Amount"));
        assert_eq!(columns.header(ColumnRole::Credit), Some("Credit Amount"));
        assert_eq!(columns.header(ColumnRole::Balance), Some("Balance"));
        assert_eq!(columns.header(ColumnRole::Category), Some("Category"));
        assert_eq!(
            columns.header(ColumnRole::Description),
            Some("Transaction Description")
        );
        assert!(!columns.has(ColumnRole::Amount));
    }

    #[test]
    fn test_resolve_columns_case_insensitive() {
        let headers = vec!["POSTING DATE".to_string(), "AMOUNT".to_string()];
        let columns = resolve_columns(&headers);
        assert_eq!(columns.index(ColumnRole::Date), Some(0));
        assert_eq!(columns.index(ColumnRole::Amount), Some(1));
    }

    #[test]
    fn test_second_date_column_does_not_take_amount() {
        let csv = "Booking Date,Value Date,Description,Amount
2025-01-02,2025-01-03,TESCO,-12.40
2025-01-05,2025-01-05,SALARY,1500.00
";
        let table = load(csv).unwrap();

        assert_eq!(table.columns.header(ColumnRole::Date), Some("Booking Date"));
        assert_eq!(table.columns.header(ColumnRole::Amount), Some("Amount"));
        assert!(table
            .extra_columns
            .iter()
            .any(|c| c.header == "Value Date"));

        let amounts: Vec<_> = table
            .transactions
            .iter()
            .map(|t| t.number(ColumnRole::Amount))
            .collect();
        assert_eq!(amounts, [Some(-12.40), Some(1500.00)]);
        assert!((table.total_debit() - 12.40).abs() < 1e-9);
        assert!((table.total_credit() - 1500.00).abs() < 1e-9);
    }

    #[test]
    fn test_load_full_statement() {
        let table = load(LLOYDS_STYLE).unwrap();
        assert_eq!(table.len(), 5);
        assert_eq!(table.skipped_rows, 0);

        let first = &table.transactions[0];
        assert_eq!(first.date, date(2025, 1, 2));
        assert_eq!(first.kind.as_deref(), Some("DEB"));
        assert_eq!(first.debit, Some(23.40));
        assert_eq!(first.credit, None);
        assert_eq!(first.category.as_deref(), Some("Groceries"));

        let salary = &table.transactions[1];
        assert_eq!(salary.credit, Some(2150.0));
        assert_eq!(salary.balance, Some(3126.60));

        // Rows keep file order
        let descriptions: Vec<_> = table
            .transactions
            .iter()
            .map(|t| t.description.as_deref().unwrap())
            .collect();
        assert_eq!(
            descriptions,
            ["TESCO STORES", "SALARY ACME LTD", "COUNCIL TAX", "COSTA COFFEE", "RENT"]
        );
    }

    #[test]
    fn test_extra_columns_classified() {
        let table = load(LLOYDS_STYLE).unwrap();
        let extras: Vec<_> = table
            .extra_columns
            .iter()
            .map(|c| (c.header.as_str(), c.numeric))
            .collect();
        assert_eq!(extras, [("Sort Code", false), ("Account Number", true)]);
        assert_eq!(
            table.transactions[0].extras[1],
            Some(Value::Number(12345678.0))
        );
    }

    #[test]
    fn test_blank_amounts_are_null_not_zero() {
        let table = load(LLOYDS_STYLE).unwrap();
        let null_debits = table
            .transactions
            .iter()
            .filter(|t| t.debit.is_none())
            .count();
        assert_eq!(null_debits, 1);
        let null_credits = table
            .transactions
            .iter()
            .filter(|t| t.credit.is_none())
            .count();
        assert_eq!(null_credits, 4);
    }

    #[test]
    fn test_unparseable_amount_becomes_null() {
        let csv = "Date,Debit,Credit\n2025-01-02,abc,\n2025-01-03,4.50,\n";
        let table = load(csv).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.transactions[0].debit, None);
        assert_eq!(table.transactions[1].debit, Some(4.5));
    }

    #[test]
    fn test_rows_with_bad_dates_are_dropped() {
        let csv = "Date,Amount\n2025-01-02,-5.00\nnot a date,-3.00\n2025-01-04,10.00\n";
        let table = load(csv).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.skipped_rows, 1);
    }

    #[test]
    fn test_missing_date_column_is_load_error() {
        let err = load("Description,Amount\nCOFFEE,-3.00\n").unwrap_err();
        assert!(matches!(err, Error::Load { .. }));
        assert!(err.to_string().contains("date"));
    }

    #[test]
    fn test_missing_amount_column_is_load_error() {
        let err = load("Date,Description\n2025-01-02,COFFEE\n").unwrap_err();
        assert!(matches!(err, Error::Load { .. }));
    }

    #[test]
    fn test_header_only_is_load_error() {
        let err = load("Date,Amount\n").unwrap_err();
        assert!(err.to_string().contains("no parsable rows"));
    }

    #[test]
    fn test_empty_input_is_load_error() {
        assert!(matches!(load(""), Err(Error::Load { .. })));
    }

    #[test]
    fn test_semicolon_decimal_comma_export() {
        let opts = LoaderOptions {
            delimiter: b';',
            number_format: NumberFormat {
                decimal_separator: ',',
                thousands_separator: Some('.'),
            },
            date_formats: vec!["%d.%m.%Y".to_string()],
        };
        let csv = "Date;Amount;Balance\n02.01.2025;-1.234,50;100,00\n";
        let table = load_reader(csv.as_bytes(), &opts).unwrap();
        assert_eq!(table.transactions[0].amount, Some(-1234.5));
        assert_eq!(table.transactions[0].outflow(), Some(1234.5));
        assert_eq!(table.transactions[0].balance, Some(100.0));
    }

    #[test]
    fn test_bom_is_stripped_from_first_header() {
        let csv = "\u{feff}Date,Amount\n2025-01-02,-1.00\n";
        let table = load(csv).unwrap();
        assert_eq!(table.headers[0], "Date");
    }

    #[test]
    fn test_load_file_missing_path() {
        let err = load_file(Path::new("/nonexistent/statement.csv"), &LoaderOptions::default())
            .unwrap_err();
        match err {
            Error::Load { path, .. } => {
                assert_eq!(path, Path::new("/nonexistent/statement.csv"))
            }
            other => panic!("expected load error, got {other:?}"),
        }
    }
}
