use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Whether money came in or went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TxnType {
    Income,
    Expense,
}

impl TxnType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }

    /// Sign derivation for imports without a type column: positive amounts
    /// are income, negative amounts are expenses. Callers can tell whether
    /// this was used via `ColumnMap::derives_type`.
    pub fn from_sign(amount: Decimal) -> Self {
        if amount > Decimal::ZERO {
            Self::Income
        } else {
            Self::Expense
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::fmt::Display for TxnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// A persisted transaction. `amount` is always positive; direction lives in
/// `kind`.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: Option<i64>,
    pub user_id: i64,
    pub kind: TxnType,
    pub category: String,
    pub subcategory: Option<String>,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub currency: String,
    pub notes: String,
    pub created_at: String,
}

/// A validated import row or manual entry, ready for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDraft {
    pub kind: TxnType,
    pub category: String,
    pub subcategory: Option<String>,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub currency: String,
    pub notes: String,
}
