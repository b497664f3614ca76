use chrono::NaiveDate;
use saldo_core::{
    CategoryRuleset, Money, Source, Transaction, TransactionId, DEFAULT_EXCLUSION_PHRASE,
};

use crate::mapping::CanonicalRow;
use crate::normalize::{ParseOutcome, RawRecord, TransactionNormalizer};
use crate::rules::CategoryMatcher;
use crate::table::Cell;

/// Expense typed in by hand. The amount is always stored negative.
#[derive(Debug, Clone, PartialEq)]
pub struct ManualExpense {
    pub date: NaiveDate,
    pub description: String,
    pub amount: Money,
}

impl ManualExpense {
    pub fn new(date: NaiveDate, description: impl Into<String>, amount: Money) -> Self {
        ManualExpense {
            date,
            description: description.into(),
            amount: -amount.abs(),
        }
    }

    fn to_record(&self) -> RawRecord {
        RawRecord {
            date: Cell::Date(self.date),
            description: Cell::from(self.description.as_str()),
            amount: Cell::Number(self.amount.as_decimal()),
            source: Source::Manual,
        }
    }
}

/// Counts from one rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub uploaded: usize,
    pub manual: usize,
    pub excluded: usize,
    pub dropped: usize,
}

impl BuildReport {
    pub fn kept(&self) -> usize {
        self.uploaded + self.manual - self.excluded - self.dropped
    }
}

/// Merges uploaded and manual rows into the categorized transaction list.
#[derive(Debug, Clone)]
pub struct IngestionPipeline {
    normalizer: TransactionNormalizer,
    exclusion_phrases: Vec<String>,
}

impl Default for IngestionPipeline {
    fn default() -> Self {
        Self::new(
            TransactionNormalizer::default(),
            vec![DEFAULT_EXCLUSION_PHRASE.to_string()],
        )
    }
}

impl IngestionPipeline {
    pub fn new(normalizer: TransactionNormalizer, exclusion_phrases: Vec<String>) -> Self {
        let exclusion_phrases = exclusion_phrases
            .into_iter()
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        Self {
            normalizer,
            exclusion_phrases,
        }
    }

    /// Case-insensitive, accents kept.
    pub fn is_excluded(&self, title: &str) -> bool {
        let title = title.to_lowercase();
        self.exclusion_phrases.iter().any(|p| title.contains(p.as_str()))
    }

    pub fn build_transactions(
        &self,
        uploaded: &[CanonicalRow],
        manual: &[ManualExpense],
        ruleset: &CategoryRuleset,
    ) -> Vec<Transaction> {
        self.build_report(uploaded, manual, ruleset).0
    }

    /// Rebuilds from scratch: uploaded rows first, then manual ones, in
    /// input order. Ids are positions in the result, so a rebuild from the
    /// same inputs yields the same list.
    pub fn build_report(
        &self,
        uploaded: &[CanonicalRow],
        manual: &[ManualExpense],
        ruleset: &CategoryRuleset,
    ) -> (Vec<Transaction>, BuildReport) {
        let mut report = BuildReport {
            uploaded: uploaded.len(),
            manual: manual.len(),
            ..BuildReport::default()
        };

        // Exclusion looks at the raw title, before any parsing.
        let mut records: Vec<RawRecord> = Vec::with_capacity(uploaded.len() + manual.len());
        for row in uploaded {
            let title = row.title.to_string();
            if self.is_excluded(&title) {
                tracing::debug!(%title, "excluded row");
                report.excluded += 1;
                continue;
            }
            records.push(RawRecord {
                date: row.date.clone(),
                description: row.title.clone(),
                amount: row.amount.clone(),
                source: Source::Uploaded,
            });
        }
        records.extend(manual.iter().map(ManualExpense::to_record));

        let matcher = CategoryMatcher::new(ruleset);
        let mut transactions = Vec::with_capacity(records.len());
        for record in &records {
            match self.normalizer.parse(record) {
                ParseOutcome::Parsed(row) => {
                    let category = matcher.categorize(&row.description).to_string();
                    transactions.push(Transaction {
                        id: TransactionId(transactions.len() as u64),
                        date: row.date,
                        description: row.description,
                        amount: row.amount,
                        category,
                        month: row.month,
                        source: row.source,
                    });
                }
                ParseOutcome::Dropped(reason) => {
                    tracing::debug!(?reason, source = %record.source, "dropped row");
                    report.dropped += 1;
                }
            }
        }

        tracing::info!(
            kept = transactions.len(),
            excluded = report.excluded,
            dropped = report.dropped,
            "rebuilt transactions"
        );
        (transactions, report)
    }
}
