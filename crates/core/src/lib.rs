pub mod aggregate;
pub mod budget;
pub mod category;
pub mod edit;
pub mod money;
pub mod period;
pub mod planning;
pub mod text;
pub mod transaction;
pub mod view;

pub use aggregate::{
    available_months, category_totals, monthly_summary, period_totals, CategoryTotal,
    IncomeByMonth, MonthlyAggregate, PeriodTotals,
};
pub use budget::{variance, Budget, BudgetEntry, VarianceRow};
pub use category::{CategoryRule, CategoryRuleset, RulesetError, FALLBACK_CATEGORY};
pub use edit::{apply_edits, EditSummary};
pub use money::{parse_decimal_input, Money, MoneyError};
pub use period::{DateRange, MonthBucket, MonthBucketError, DEFAULT_DATE_FORMATS};
pub use planning::{planning_summary, IncomeForecast, PlannedExpense, PlanningSummary, RecurringExpense};
pub use transaction::{Source, Transaction, TransactionId, DEFAULT_EXCLUSION_PHRASE};
pub use view::{filter_view, SortKey, SortOrder, TransactionFilter};
