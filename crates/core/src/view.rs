use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

use super::money::Money;
use super::period::DateRange;
use super::transaction::Transaction;

/// Filters for the detail view. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionFilter {
    /// Case-insensitive substring of the description.
    pub search: Option<String>,
    pub dates: Option<DateRange>,
    /// Empty means every category.
    pub categories: BTreeSet<String>,
    /// Inclusive bounds on the absolute amount.
    pub min_spend: Option<Money>,
    pub max_spend: Option<Money>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    #[default]
    Date,
    Description,
    Amount,
    Spend,
    Category,
    Month,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl TransactionFilter {
    pub fn matches(&self, tx: &Transaction) -> bool {
        if let Some(range) = self.dates {
            if !range.contains(tx.date) {
                return false;
            }
        }
        if !self.categories.is_empty() && !self.categories.contains(&tx.category) {
            return false;
        }
        let spend = tx.spend();
        if self.min_spend.is_some_and(|min| spend < min) {
            return false;
        }
        if self.max_spend.is_some_and(|max| spend > max) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => tx
                .description
                .to_lowercase()
                .contains(&term.to_lowercase()),
            _ => true,
        }
    }
}

/// Filtered, sorted copy of the canonical set. Copies keep their ids so the
/// view can be fed back through `apply_edits`. Sorting is stable; ties fall
/// back to id order.
pub fn filter_view(
    transactions: &[Transaction],
    filter: &TransactionFilter,
    key: SortKey,
    order: SortOrder,
) -> Vec<Transaction> {
    let mut view: Vec<Transaction> = transactions
        .iter()
        .filter(|tx| filter.matches(tx))
        .cloned()
        .collect();
    view.sort_by(|a, b| {
        let ord = compare(a, b, key);
        let ord = match order {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        };
        ord.then_with(|| a.id.cmp(&b.id))
    });
    view
}

fn compare(a: &Transaction, b: &Transaction, key: SortKey) -> Ordering {
    match key {
        SortKey::Date => a.date.cmp(&b.date),
        SortKey::Description => a.description.to_lowercase().cmp(&b.description.to_lowercase()),
        SortKey::Amount => a.amount.cmp(&b.amount),
        SortKey::Spend => a.spend().cmp(&b.spend()),
        SortKey::Category => a.category.cmp(&b.category),
        SortKey::Month => a.month.cmp(&b.month),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{Source, TransactionId};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(id: u64, day: u32, desc: &str, cents: i64, category: &str) -> Transaction {
        Transaction::new(
            TransactionId(id),
            date(2024, 1, day),
            desc,
            Money::from_cents(cents),
            category,
            Source::Uploaded,
        )
        .unwrap()
    }

    fn sample() -> Vec<Transaction> {
        vec![
            tx(0, 5, "iFood *Pedido", -4590, "Alimentação"),
            tx(1, 2, "Uber Trip", -1800, "Transporte"),
            tx(2, 9, "IFOOD MERCADO", -12000, "Alimentação"),
            tx(3, 9, "Cinema", -3000, "Lazer"),
        ]
    }

    fn ids(view: &[Transaction]) -> Vec<u64> {
        view.iter().map(|t| t.id.0).collect()
    }

    #[test]
    fn default_filter_keeps_all_newest_first() {
        let view = filter_view(&sample(), &TransactionFilter::default(), SortKey::Date, SortOrder::Descending);
        assert_eq!(ids(&view), [2, 3, 0, 1]);
    }

    #[test]
    fn search_is_case_insensitive() {
        let filter = TransactionFilter {
            search: Some("ifood".to_string()),
            ..Default::default()
        };
        let view = filter_view(&sample(), &filter, SortKey::Date, SortOrder::Ascending);
        assert_eq!(ids(&view), [0, 2]);
    }

    #[test]
    fn category_and_spend_range() {
        let filter = TransactionFilter {
            categories: BTreeSet::from(["Alimentação".to_string(), "Lazer".to_string()]),
            min_spend: Some(Money::from_cents(3000)),
            max_spend: Some(Money::from_cents(5000)),
            ..Default::default()
        };
        let view = filter_view(&sample(), &filter, SortKey::Spend, SortOrder::Ascending);
        assert_eq!(ids(&view), [3, 0]);
    }

    #[test]
    fn date_range_is_inclusive() {
        let filter = TransactionFilter {
            dates: Some(DateRange::new(date(2024, 1, 2), date(2024, 1, 5))),
            ..Default::default()
        };
        let view = filter_view(&sample(), &filter, SortKey::Date, SortOrder::Ascending);
        assert_eq!(ids(&view), [1, 0]);
    }

    #[test]
    fn sort_by_description_ignores_case() {
        let view = filter_view(
            &sample(),
            &TransactionFilter::default(),
            SortKey::Description,
            SortOrder::Ascending,
        );
        assert_eq!(ids(&view), [3, 0, 2, 1]);
    }
}
