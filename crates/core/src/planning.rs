use serde::{Deserialize, Serialize};

use super::money::Money;

/// Subscription or bill that repeats every month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringExpense {
    pub description: String,
    pub amount: Money,
    pub category: Option<String>,
}

/// Fixed expense expected for the planned month that does not repeat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedExpense {
    pub description: String,
    pub amount: Money,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeForecast {
    pub fixed: Money,
    pub variable: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningSummary {
    pub total_income: Money,
    pub recurring_total: Money,
    pub planned_total: Money,
    pub planned_expenses_total: Money,
    pub projected_balance: Money,
}

impl PlanningSummary {
    pub fn is_deficit(&self) -> bool {
        self.projected_balance.is_negative()
    }
}

pub fn planning_summary(
    forecast: &IncomeForecast,
    recurring: &[RecurringExpense],
    planned: &[PlannedExpense],
) -> PlanningSummary {
    let total_income = forecast.fixed + forecast.variable;
    let recurring_total: Money = recurring.iter().map(|e| e.amount).sum();
    let planned_total: Money = planned.iter().map(|e| e.amount).sum();
    let planned_expenses_total = recurring_total + planned_total;
    PlanningSummary {
        total_income,
        recurring_total,
        planned_total,
        planned_expenses_total,
        projected_balance: total_income - planned_expenses_total,
    }
}
