use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::money::Money;
use super::period::MonthBucket;

/// Uploaded rows whose title contains this phrase are card payments, not
/// spending.
pub const DEFAULT_EXCLUSION_PHRASE: &str = "pagamento recebido";

/// Stable row identity. Survives filtering, sorting and copying of views,
/// and is reassigned only by a full rebuild of the canonical set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub u64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    Uploaded,
    Manual,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Uploaded => write!(f, "uploaded"),
            Source::Manual => write!(f, "manual"),
        }
    }
}

/// A member of the canonical transaction set.
///
/// `amount` is never zero; `month` always matches `date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub date: NaiveDate,
    pub description: String,
    pub amount: Money,
    pub category: String,
    pub month: MonthBucket,
    pub source: Source,
}

impl Transaction {
    pub fn new(
        id: TransactionId,
        date: NaiveDate,
        description: impl Into<String>,
        amount: Money,
        category: impl Into<String>,
        source: Source,
    ) -> Option<Self> {
        Some(Transaction {
            id,
            date,
            description: description.into(),
            amount,
            category: category.into(),
            month: MonthBucket::from_date(date)?,
            source,
        })
    }

    /// Magnitude of the amount, used by every spend aggregate.
    pub fn spend(&self) -> Money {
        self.amount.abs()
    }

    pub fn is_expense(&self) -> bool {
        self.amount.is_negative()
    }

    /// Returns `false` and leaves the row alone when the date has no month
    /// bucket.
    pub fn set_date(&mut self, date: NaiveDate) -> bool {
        let Some(month) = MonthBucket::from_date(date) else {
            return false;
        };
        self.date = date;
        self.month = month;
        true
    }
}
