use chrono::NaiveDate;
use saldo_core::{
    available_months, category_totals, filter_view, monthly_summary, parse_decimal_input,
    period_totals, planning_summary, variance, Budget, CategoryRuleset, CategoryTotal,
    EditSummary, IncomeByMonth, IncomeForecast, Money, MoneyError, MonthBucket, MonthlyAggregate,
    PeriodTotals, PlannedExpense, PlanningSummary, RecurringExpense, RulesetError, SortKey,
    SortOrder, Transaction, TransactionFilter, TransactionId, VarianceRow,
};
use saldo_import::{
    apply_mapping, read_table, CanonicalRow, ColumnMapping, IngestionPipeline, ManualExpense,
    MappingError, RawTable, ReadError, TransactionNormalizer,
};
use saldo_storage::{load_or_seed, Config, ConfigError, RulesetStore, StoreError};
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No file has been uploaded")]
    NoUpload,
    #[error(transparent)]
    Mapping(#[from] MappingError),
    #[error("Could not read upload: {0}")]
    Read(#[from] ReadError),
    #[error("Invalid value for {field}: {source}")]
    InvalidNumber {
        field: String,
        #[source]
        source: MoneyError,
    },
    #[error("{0} must not be negative")]
    NegativeAmount(String),
    #[error("Amount must not be zero")]
    ZeroAmount,
    #[error("Description is required")]
    MissingDescription,
    #[error("Unknown category: {0}")]
    UnknownCategory(String),
    #[error(transparent)]
    Ruleset(#[from] RulesetError),
    #[error("Could not save categories: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// State of one user session: the ruleset, both transaction sources, the
/// canonical set built from them, and everything the user declared by hand.
///
/// Operations run one at a time to completion. A failing operation returns
/// an error and leaves the session as it was.
pub struct Session {
    store: Box<dyn RulesetStore>,
    ruleset: CategoryRuleset,
    pipeline: IngestionPipeline,
    delimiter: u8,

    raw_upload: Option<RawTable>,
    mapping: Option<ColumnMapping>,
    uploaded: Vec<CanonicalRow>,
    manual: Vec<ManualExpense>,
    /// `None` while neither source has rows.
    transactions: Option<Vec<Transaction>>,

    income: IncomeByMonth,
    budget: Budget,
    recurring: Vec<RecurringExpense>,
    planned: Vec<PlannedExpense>,
    forecast: IncomeForecast,
}

impl Session {
    /// Session with the default pipeline, using the store's ruleset or the
    /// built-in defaults.
    pub fn new(store: impl RulesetStore + 'static) -> Result<Self, SessionError> {
        Self::with_pipeline(Box::new(store), IngestionPipeline::default(), b',')
    }

    pub fn from_config(config: &Config, store: impl RulesetStore + 'static) -> Result<Self, SessionError> {
        let pipeline = IngestionPipeline::new(
            TransactionNormalizer::new(config.date_formats.clone()),
            config.exclusion_phrases.clone(),
        );
        Self::with_pipeline(Box::new(store), pipeline, config.delimiter()?)
    }

    fn with_pipeline(
        store: Box<dyn RulesetStore>,
        pipeline: IngestionPipeline,
        delimiter: u8,
    ) -> Result<Self, SessionError> {
        let ruleset = load_or_seed(store.as_ref())?;
        let budget = Budget::for_ruleset(&ruleset);
        Ok(Self {
            store,
            ruleset,
            pipeline,
            delimiter,
            raw_upload: None,
            mapping: None,
            uploaded: Vec::new(),
            manual: Vec::new(),
            transactions: None,
            income: IncomeByMonth::new(),
            budget,
            recurring: Vec::new(),
            planned: Vec::new(),
            forecast: IncomeForecast::default(),
        })
    }

    // ── Upload ────────────────────────────────────────────────────────────────

    /// Replaces the upload. The previous mapping, its mapped rows and the
    /// canonical set built from them are discarded.
    pub fn load_upload(&mut self, table: RawTable) {
        tracing::info!(rows = table.len(), columns = table.headers().len(), "new upload");
        self.raw_upload = Some(table);
        self.mapping = None;
        self.uploaded.clear();
        self.rebuild();
    }

    /// Reads a file and loads it as the new upload. Nothing changes when the
    /// file cannot be read.
    pub fn read_upload(&mut self, path: &Path) -> Result<(), SessionError> {
        let table = read_table(path, self.delimiter)?;
        self.load_upload(table);
        Ok(())
    }

    /// Column names of the current upload, for building a mapping.
    pub fn upload_columns(&self) -> &[String] {
        self.raw_upload.as_ref().map(RawTable::headers).unwrap_or_default()
    }

    pub fn mapping(&self) -> Option<&ColumnMapping> {
        self.mapping.as_ref()
    }

    /// Applies `mapping` to the current upload and rebuilds. Returns the
    /// number of mapped rows.
    pub fn confirm_mapping(&mut self, mapping: ColumnMapping) -> Result<usize, SessionError> {
        let table = self.raw_upload.as_ref().ok_or(SessionError::NoUpload)?;
        let rows = apply_mapping(table, &mapping)?;
        let count = rows.len();
        self.uploaded = rows;
        self.mapping = Some(mapping);
        self.rebuild();
        Ok(count)
    }

    // ── Manual expenses ───────────────────────────────────────────────────────

    /// `amount_text` is a magnitude; the expense is stored negative.
    pub fn add_manual_expense(
        &mut self,
        description: &str,
        amount_text: &str,
        date: NaiveDate,
    ) -> Result<(), SessionError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(SessionError::MissingDescription);
        }
        let amount = parse_field("amount", amount_text)?;
        if amount.is_zero() {
            return Err(SessionError::ZeroAmount);
        }
        self.manual.push(ManualExpense::new(date, description, amount));
        self.rebuild();
        Ok(())
    }

    pub fn manual_expenses(&self) -> &[ManualExpense] {
        &self.manual
    }

    /// Rebuilds the canonical set from both sources. Edits made since the
    /// last rebuild are lost.
    pub fn rebuild(&mut self) {
        if self.uploaded.is_empty() && self.manual.is_empty() {
            self.transactions = None;
            return;
        }
        self.transactions = Some(
            self.pipeline
                .build_transactions(&self.uploaded, &self.manual, &self.ruleset),
        );
    }

    pub fn has_data(&self) -> bool {
        self.transactions.is_some()
    }

    pub fn transactions(&self) -> &[Transaction] {
        self.transactions.as_deref().unwrap_or_default()
    }

    // ── Categories ────────────────────────────────────────────────────────────

    pub fn ruleset(&self) -> &CategoryRuleset {
        &self.ruleset
    }

    pub fn categorize(&self, description: &str) -> &str {
        saldo_import::categorize(description, &self.ruleset)
    }

    /// Adds or replaces a category. Saved at once; existing transactions
    /// keep their category until the next rebuild.
    pub fn add_category(&mut self, name: &str, keywords_text: &str) -> Result<(), SessionError> {
        self.update_ruleset(|rules| rules.add_category(name, keywords_text))
    }

    pub fn set_keywords(&mut self, name: &str, keywords_text: &str) -> Result<(), SessionError> {
        self.update_ruleset(|rules| rules.set_keywords(name, keywords_text))
    }

    pub fn remove_category(&mut self, name: &str) -> Result<(), SessionError> {
        self.update_ruleset(|rules| rules.remove_category(name).map(drop))
    }

    fn update_ruleset<F>(&mut self, change: F) -> Result<(), SessionError>
    where
        F: FnOnce(&mut CategoryRuleset) -> Result<(), RulesetError>,
    {
        let mut next = self.ruleset.clone();
        change(&mut next)?;
        self.store.save(&next)?;
        self.ruleset = next;
        self.budget.sync_with_ruleset(&self.ruleset);
        Ok(())
    }

    // ── Income and budget ─────────────────────────────────────────────────────

    /// Empty text clears the month to zero.
    pub fn set_income(&mut self, month: MonthBucket, text: &str) -> Result<(), SessionError> {
        let amount = parse_non_negative("income", text, true)?;
        self.income.insert(month, amount);
        Ok(())
    }

    /// All values are checked before any is stored.
    pub fn set_incomes<'a, I>(&mut self, entries: I) -> Result<(), SessionError>
    where
        I: IntoIterator<Item = (MonthBucket, &'a str)>,
    {
        let parsed = entries
            .into_iter()
            .map(|(month, text)| -> Result<(MonthBucket, Money), SessionError> {
                Ok((month, parse_non_negative(&format!("income {month}"), text, true)?))
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.income.extend(parsed);
        Ok(())
    }

    pub fn income(&self) -> &IncomeByMonth {
        &self.income
    }

    pub fn set_budget(&mut self, category: &str, text: &str) -> Result<(), SessionError> {
        let amount = parse_non_negative(&format!("budget {category}"), text, false)?;
        self.budget
            .set(category, amount)
            .map_err(|_| SessionError::UnknownCategory(category.to_string()))
    }

    pub fn budget(&self) -> &Budget {
        &self.budget
    }

    pub fn total_budgeted(&self) -> Money {
        self.budget.total_budgeted()
    }

    // ── Reports ───────────────────────────────────────────────────────────────

    pub fn monthly_summary(&self) -> Vec<MonthlyAggregate> {
        monthly_summary(self.transactions(), &self.income)
    }

    pub fn period_totals(&self) -> PeriodTotals {
        period_totals(&self.monthly_summary())
    }

    pub fn category_totals(&self, month: Option<MonthBucket>) -> Vec<CategoryTotal> {
        category_totals(self.transactions(), month)
    }

    /// Budget against the spend of one month.
    pub fn budget_variance(&self, month: MonthBucket) -> Vec<VarianceRow> {
        variance(&self.budget, &self.category_totals(Some(month)))
    }

    pub fn available_months(&self) -> Vec<MonthBucket> {
        available_months(self.transactions())
    }

    // ── Detail view ───────────────────────────────────────────────────────────

    pub fn view(&self, filter: &TransactionFilter, key: SortKey, order: SortOrder) -> Vec<Transaction> {
        filter_view(self.transactions(), filter, key, order)
    }

    /// Writes an edited view back. A changed category must exist in the
    /// ruleset; rows that vanished in the meantime are skipped.
    pub fn apply_edits(
        &mut self,
        edited_view: &[Transaction],
        deletions: &BTreeSet<TransactionId>,
    ) -> Result<EditSummary, SessionError> {
        // Rows whose category was not changed may still carry a removed name.
        let current = self.transactions();
        if let Some(tx) = edited_view.iter().find(|tx| {
            !deletions.contains(&tx.id)
                && !self.ruleset.contains(&tx.category)
                && current
                    .iter()
                    .find(|c| c.id == tx.id)
                    .is_some_and(|c| c.category != tx.category)
        }) {
            return Err(SessionError::UnknownCategory(tx.category.clone()));
        }
        let Some(transactions) = self.transactions.as_mut() else {
            return Ok(EditSummary::default());
        };
        let summary = saldo_core::apply_edits(transactions, edited_view, deletions);
        tracing::info!(
            deleted = summary.deleted,
            updated = summary.updated,
            stale = summary.stale,
            "applied edits"
        );
        Ok(summary)
    }

    // ── Planning ──────────────────────────────────────────────────────────────

    pub fn add_recurring_expense(
        &mut self,
        description: &str,
        amount_text: &str,
        category: Option<&str>,
    ) -> Result<(), SessionError> {
        let (description, amount, category) = self.planning_row(description, amount_text, category)?;
        self.recurring.push(RecurringExpense {
            description,
            amount,
            category,
        });
        Ok(())
    }

    pub fn add_planned_expense(
        &mut self,
        description: &str,
        amount_text: &str,
        category: Option<&str>,
    ) -> Result<(), SessionError> {
        let (description, amount, category) = self.planning_row(description, amount_text, category)?;
        self.planned.push(PlannedExpense {
            description,
            amount,
            category,
        });
        Ok(())
    }

    fn planning_row(
        &self,
        description: &str,
        amount_text: &str,
        category: Option<&str>,
    ) -> Result<(String, Money, Option<String>), SessionError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(SessionError::MissingDescription);
        }
        let amount = parse_non_negative("amount", amount_text, false)?;
        let category = match category.map(str::trim).filter(|c| !c.is_empty()) {
            Some(c) if !self.ruleset.contains(c) => {
                return Err(SessionError::UnknownCategory(c.to_string()))
            }
            other => other.map(str::to_string),
        };
        Ok((description.to_string(), amount, category))
    }

    pub fn recurring_expenses(&self) -> &[RecurringExpense] {
        &self.recurring
    }

    pub fn planned_expenses(&self) -> &[PlannedExpense] {
        &self.planned
    }

    /// Empty text means zero.
    pub fn set_forecast_fixed(&mut self, text: &str) -> Result<(), SessionError> {
        self.forecast.fixed = parse_non_negative("fixed income", text, true)?;
        Ok(())
    }

    pub fn set_forecast_variable(&mut self, text: &str) -> Result<(), SessionError> {
        self.forecast.variable = parse_non_negative("variable income", text, true)?;
        Ok(())
    }

    pub fn planning_summary(&self) -> PlanningSummary {
        planning_summary(&self.forecast, &self.recurring, &self.planned)
    }
}

fn parse_field(field: &str, text: &str) -> Result<Money, SessionError> {
    parse_decimal_input(text).map_err(|source| SessionError::InvalidNumber {
        field: field.to_string(),
        source,
    })
}

fn parse_non_negative(field: &str, text: &str, empty_is_zero: bool) -> Result<Money, SessionError> {
    if empty_is_zero && text.trim().is_empty() {
        return Ok(Money::zero());
    }
    let amount = parse_field(field, text)?;
    if amount.is_negative() {
        return Err(SessionError::NegativeAmount(field.to_string()));
    }
    Ok(amount)
}
