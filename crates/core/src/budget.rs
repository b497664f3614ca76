use serde::{Deserialize, Serialize};

use super::aggregate::CategoryTotal;
use super::category::{CategoryRuleset, RulesetError};
use super::money::Money;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetEntry {
    pub category: String,
    /// Monthly budget; zero means the category is not tracked.
    pub amount: Money,
}

/// Per-category monthly budget, kept in ruleset order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    entries: Vec<BudgetEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarianceRow {
    pub category: String,
    pub budgeted: Money,
    pub actual: Money,
    /// `budgeted - actual`; negative when over budget.
    pub remaining: Money,
}

impl Budget {
    /// Every category of the ruleset at zero.
    pub fn for_ruleset(ruleset: &CategoryRuleset) -> Self {
        let mut budget = Budget::default();
        budget.sync_with_ruleset(ruleset);
        budget
    }

    /// Adds missing categories at zero and drops categories that no longer
    /// exist, keeping the amounts of the rest.
    pub fn sync_with_ruleset(&mut self, ruleset: &CategoryRuleset) {
        self.entries = ruleset
            .names()
            .map(|name| BudgetEntry {
                category: name.to_string(),
                amount: self.get(name),
            })
            .collect();
    }

    pub fn entries(&self) -> &[BudgetEntry] {
        &self.entries
    }

    pub fn get(&self, category: &str) -> Money {
        self.entries
            .iter()
            .find(|e| e.category == category)
            .map(|e| e.amount)
            .unwrap_or_default()
    }

    pub fn set(&mut self, category: &str, amount: Money) -> Result<(), RulesetError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.category == category)
            .ok_or_else(|| RulesetError::UnknownCategory(category.to_string()))?;
        entry.amount = amount;
        Ok(())
    }

    pub fn total_budgeted(&self) -> Money {
        self.entries.iter().map(|e| e.amount).sum()
    }
}

/// Budget versus actual spend. Categories without a positive budget are
/// left out even when they have spend.
pub fn variance(budget: &Budget, actual: &[CategoryTotal]) -> Vec<VarianceRow> {
    budget
        .entries()
        .iter()
        .filter(|e| e.amount.is_positive())
        .map(|e| {
            let spent = actual
                .iter()
                .find(|t| t.category == e.category)
                .map(|t| t.total)
                .unwrap_or_default();
            VarianceRow {
                category: e.category.clone(),
                budgeted: e.amount,
                actual: spent,
                remaining: e.amount - spent,
            }
        })
        .collect()
}
