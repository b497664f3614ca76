use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::money::Money;
use super::period::MonthBucket;
use super::transaction::Transaction;

/// Income declared by the user per month. Not derived from transactions.
pub type IncomeByMonth = BTreeMap<MonthBucket, Money>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyAggregate {
    pub month: MonthBucket,
    pub total_income: Money,
    pub total_expense: Money,
    /// `total_income - total_expense`
    pub balance: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PeriodTotals {
    pub total_income: Money,
    pub total_expense: Money,
    pub balance: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Money,
}

/// Outer join of per-month expense totals with the declared income map,
/// ascending by month. Only negative amounts count as expense; a month that
/// appears on either side is reported with the other side as zero.
pub fn monthly_summary(
    transactions: &[Transaction],
    income_by_month: &IncomeByMonth,
) -> Vec<MonthlyAggregate> {
    let mut expenses: BTreeMap<MonthBucket, Money> = BTreeMap::new();
    for tx in transactions {
        let entry = expenses.entry(tx.month).or_default();
        if tx.is_expense() {
            *entry += tx.spend();
        }
    }
    for month in income_by_month.keys() {
        expenses.entry(*month).or_default();
    }

    expenses
        .into_iter()
        .map(|(month, total_expense)| {
            let total_income = income_by_month.get(&month).copied().unwrap_or_default();
            MonthlyAggregate {
                month,
                total_income,
                total_expense,
                balance: total_income - total_expense,
            }
        })
        .collect()
}

pub fn period_totals(summary: &[MonthlyAggregate]) -> PeriodTotals {
    let total_income: Money = summary.iter().map(|m| m.total_income).sum();
    let total_expense: Money = summary.iter().map(|m| m.total_expense).sum();
    PeriodTotals {
        total_income,
        total_expense,
        balance: total_income - total_expense,
    }
}

/// Spend per category, optionally scoped to one month, ranked by total
/// descending (ties by name).
pub fn category_totals(transactions: &[Transaction], month: Option<MonthBucket>) -> Vec<CategoryTotal> {
    let mut totals: BTreeMap<&str, Money> = BTreeMap::new();
    for tx in transactions
        .iter()
        .filter(|tx| tx.is_expense())
        .filter(|tx| month.map_or(true, |m| tx.month == m))
    {
        *totals.entry(tx.category.as_str()).or_default() += tx.spend();
    }

    let mut ranked: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category, total)| CategoryTotal {
            category: category.to_string(),
            total,
        })
        .collect();
    ranked.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
    ranked
}

/// Distinct months present in the set, ascending.
pub fn available_months(transactions: &[Transaction]) -> Vec<MonthBucket> {
    let mut months: Vec<MonthBucket> = transactions.iter().map(|tx| tx.month).collect();
    months.sort();
    months.dedup();
    months
}
