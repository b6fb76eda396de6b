//! Domain models for Sift

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Semantic role a statement column can play
///
/// Resolution order matters: a header matches the first role whose aliases it
/// contains, so `Debit Amount` becomes `Debit` rather than `Amount`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnRole {
    Date,
    Debit,
    Credit,
    Balance,
    Type,
    Category,
    Description,
    /// Single signed amount column (negative = money out)
    Amount,
}

impl ColumnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Debit => "debit",
            Self::Credit => "credit",
            Self::Balance => "balance",
            Self::Type => "type",
            Self::Category => "category",
            Self::Description => "description",
            Self::Amount => "amount",
        }
    }

    /// All roles in resolution order
    pub fn all() -> &'static [ColumnRole] {
        &[
            Self::Date,
            Self::Debit,
            Self::Credit,
            Self::Balance,
            Self::Type,
            Self::Category,
            Self::Description,
            Self::Amount,
        ]
    }

    /// Lowercase header fragments that identify this role
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::Date => &["date"],
            Self::Debit => &["debit", "withdrawal", "paid out", "money out"],
            Self::Credit => &["credit", "deposit", "paid in", "money in"],
            Self::Balance => &["balance", "running bal"],
            Self::Type => &["type"],
            Self::Category => &["category"],
            Self::Description => &["description", "memo", "narrative", "details", "payee"],
            Self::Amount => &["amount", "value"],
        }
    }

    /// Whether cells of this role are coerced to numbers
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Debit | Self::Credit | Self::Balance | Self::Amount
        )
    }

    /// Whether this role carries money in or out of the account
    pub fn is_amount_like(&self) -> bool {
        matches!(self, Self::Debit | Self::Credit | Self::Amount)
    }
}

impl std::str::FromStr for ColumnRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "date" => Ok(Self::Date),
            "debit" => Ok(Self::Debit),
            "credit" => Ok(Self::Credit),
            "balance" => Ok(Self::Balance),
            "type" => Ok(Self::Type),
            "category" => Ok(Self::Category),
            "description" => Ok(Self::Description),
            "amount" => Ok(Self::Amount),
            _ => Err(format!("Unknown column role: {}", s)),
        }
    }
}

impl std::fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A source column bound to a role
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedColumn {
    /// Position in the source header
    pub index: usize,
    /// Header text as it appeared in the file (trimmed)
    pub header: String,
}

/// Role-to-column bindings, resolved once when the file is loaded
///
/// Downstream stages ask `has(role)` instead of looking at header names,
/// so a missing optional column is decided in exactly one place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnMap {
    bindings: BTreeMap<ColumnRole, ResolvedColumn>,
}

impl ColumnMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a role to a column; the first binding wins
    pub fn bind(&mut self, role: ColumnRole, index: usize, header: &str) -> bool {
        if self.bindings.contains_key(&role) {
            return false;
        }
        self.bindings.insert(
            role,
            ResolvedColumn {
                index,
                header: header.to_string(),
            },
        );
        true
    }

    pub fn has(&self, role: ColumnRole) -> bool {
        self.bindings.contains_key(&role)
    }

    pub fn get(&self, role: ColumnRole) -> Option<&ResolvedColumn> {
        self.bindings.get(&role)
    }

    pub fn index(&self, role: ColumnRole) -> Option<usize> {
        self.bindings.get(&role).map(|c| c.index)
    }

    pub fn header(&self, role: ColumnRole) -> Option<&str> {
        self.bindings.get(&role).map(|c| c.header.as_str())
    }

    /// Role bound to the column at `index`, if any
    pub fn role_at(&self, index: usize) -> Option<ColumnRole> {
        self.bindings
            .iter()
            .find(|(_, c)| c.index == index)
            .map(|(role, _)| *role)
    }

    pub fn has_amount(&self) -> bool {
        self.bindings.keys().any(|r| r.is_amount_like())
    }

    pub fn roles(&self) -> impl Iterator<Item = ColumnRole> + '_ {
        self.bindings.keys().copied()
    }
}

/// A cell from a column that matched no role
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
}

/// A source column that matched no role
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtraColumn {
    pub index: usize,
    pub header: String,
    /// Every non-empty cell parsed as a number
    pub numeric: bool,
}

/// One statement row
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Transaction {
    pub date: NaiveDate,
    /// Transaction type (e.g. "DEB", "FPO", "Card payment")
    pub kind: Option<String>,
    pub description: Option<String>,
    pub debit: Option<f64>,
    pub credit: Option<f64>,
    /// Signed amount for single-amount exports
    pub amount: Option<f64>,
    pub balance: Option<f64>,
    pub category: Option<String>,
    /// Cells of unrecognised columns, aligned with `TransactionTable::extra_columns`
    pub extras: Vec<Option<Value>>,
}

impl Transaction {
    /// Money out of the account, as a positive number
    pub fn outflow(&self) -> Option<f64> {
        self.debit
            .map(f64::abs)
            .or_else(|| self.amount.filter(|a| *a < 0.0).map(f64::abs))
    }

    /// Money into the account
    pub fn inflow(&self) -> Option<f64> {
        self.credit.or_else(|| self.amount.filter(|a| *a > 0.0))
    }

    /// Numeric cell for a role, if the role is numeric
    pub fn number(&self, role: ColumnRole) -> Option<f64> {
        match role {
            ColumnRole::Debit => self.debit,
            ColumnRole::Credit => self.credit,
            ColumnRole::Balance => self.balance,
            ColumnRole::Amount => self.amount,
            _ => None,
        }
    }

    /// Text cell for a role, if the role is textual
    pub fn text(&self, role: ColumnRole) -> Option<&str> {
        match role {
            ColumnRole::Type => self.kind.as_deref(),
            ColumnRole::Category => self.category.as_deref(),
            ColumnRole::Description => self.description.as_deref(),
            _ => None,
        }
    }

    /// Whether the cell for a role is null
    pub fn is_missing(&self, role: ColumnRole) -> bool {
        match role {
            ColumnRole::Date => false,
            r if r.is_numeric() => self.number(r).is_none(),
            r => self.text(r).is_none(),
        }
    }
}

/// The loaded statement: typed rows plus the column bindings that produced them
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransactionTable {
    pub source: PathBuf,
    /// Source headers in file order
    pub headers: Vec<String>,
    pub columns: ColumnMap,
    pub extra_columns: Vec<ExtraColumn>,
    /// Rows in file order
    pub transactions: Vec<Transaction>,
    /// Rows dropped because their date could not be parsed
    pub skipped_rows: usize,
}

impl TransactionTable {
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn has(&self, role: ColumnRole) -> bool {
        self.columns.has(role)
    }

    /// Earliest and latest transaction date
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.transactions.iter().map(|t| t.date).min()?;
        let last = self.transactions.iter().map(|t| t.date).max()?;
        Some((first, last))
    }

    pub fn total_debit(&self) -> f64 {
        self.transactions.iter().filter_map(|t| t.outflow()).sum()
    }

    pub fn total_credit(&self) -> f64 {
        self.transactions.iter().filter_map(|t| t.inflow()).sum()
    }
}
