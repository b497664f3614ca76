use std::collections::BTreeSet;

use super::transaction::{Transaction, TransactionId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditSummary {
    pub deleted: usize,
    pub updated: usize,
    /// Edited rows whose identity was no longer in the canonical set.
    pub stale: usize,
}

/// Applies edits made against a filtered view back onto the canonical set.
///
/// Rows in `deletions` are removed first, so a row that is both deleted and
/// edited stays deleted. Each remaining edited row then overwrites its
/// canonical counterpart by id; rows outside the view are untouched. An
/// edited row with no counterpart is skipped (last writer wins).
pub fn apply_edits(
    canonical: &mut Vec<Transaction>,
    edited_view: &[Transaction],
    deletions: &BTreeSet<TransactionId>,
) -> EditSummary {
    let mut summary = EditSummary::default();

    let before = canonical.len();
    canonical.retain(|tx| !deletions.contains(&tx.id));
    summary.deleted = before - canonical.len();

    for edited in edited_view.iter().filter(|tx| !deletions.contains(&tx.id)) {
        let Some(target) = canonical.iter_mut().find(|tx| tx.id == edited.id) else {
            tracing::warn!(id = %edited.id, "edit skipped: row no longer exists");
            summary.stale += 1;
            continue;
        };
        overwrite(target, edited);
        summary.updated += 1;
    }

    summary
}

fn overwrite(target: &mut Transaction, edited: &Transaction) {
    if target.date != edited.date && !target.set_date(edited.date) {
        tracing::warn!(id = %edited.id, date = %edited.date, "edit kept prior date: year out of range");
    }
    target.description.clone_from(&edited.description);
    target.category.clone_from(&edited.category);
    if edited.amount.is_zero() {
        tracing::warn!(id = %edited.id, "edit kept prior amount: zero is not a valid amount");
    } else {
        target.amount = edited.amount;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::transaction::Source;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(id: u64, desc: &str, category: &str) -> Transaction {
        Transaction::new(
            TransactionId(id),
            date(2024, 1, 10),
            desc,
            Money::from_cents(-1000),
            category,
            Source::Uploaded,
        )
        .unwrap()
    }

    fn canonical() -> Vec<Transaction> {
        vec![
            tx(0, "IFOOD", "Alimentação"),
            tx(1, "PADARIA", "Outros"),
            tx(2, "UBER", "Transporte"),
        ]
    }

    fn ids(set: &[Transaction]) -> Vec<u64> {
        set.iter().map(|t| t.id.0).collect()
    }

    #[test]
    fn category_reassignment() {
        let mut set = canonical();
        let mut edited = set[1].clone();
        edited.category = "Alimentação".to_string();

        let summary = apply_edits(&mut set, &[edited], &BTreeSet::new());
        assert_eq!(summary, EditSummary { deleted: 0, updated: 1, stale: 0 });
        assert_eq!(set[1].category, "Alimentação");
        assert_eq!(set[0], canonical()[0]);
        assert_eq!(set[2], canonical()[2]);
    }

    #[test]
    fn deletion_by_identity() {
        let mut set = canonical();
        let deletions = BTreeSet::from([TransactionId(0), TransactionId(2)]);
        let summary = apply_edits(&mut set, &[], &deletions);
        assert_eq!(summary.deleted, 2);
        assert_eq!(ids(&set), [1]);
    }

    #[test]
    fn deletion_wins_over_edit() {
        let mut set = canonical();
        let mut edited = set[0].clone();
        edited.category = "Lazer".to_string();
        let deletions = BTreeSet::from([TransactionId(0)]);

        let summary = apply_edits(&mut set, &[edited], &deletions);
        assert_eq!(summary, EditSummary { deleted: 1, updated: 0, stale: 0 });
        assert!(set.iter().all(|t| t.id != TransactionId(0)));
    }

    #[test]
    fn stale_identity_is_a_no_op() {
        let mut set = canonical();
        let ghost = tx(99, "GHOST", "Lazer");
        let summary = apply_edits(&mut set, &[ghost], &BTreeSet::new());
        assert_eq!(summary.stale, 1);
        assert_eq!(set, canonical());
    }

    #[test]
    fn view_order_does_not_matter() {
        let mut set = canonical();
        let mut view: Vec<Transaction> = set.iter().rev().cloned().collect();
        view[0].category = "Moradia".to_string(); // id 2

        apply_edits(&mut set, &view, &BTreeSet::new());
        assert_eq!(ids(&set), [0, 1, 2]);
        assert_eq!(set[2].category, "Moradia");
        assert_eq!(set[0].category, "Alimentação");
    }

    #[test]
    fn date_edit_moves_month_and_zero_amount_is_ignored() {
        let mut set = canonical();
        let mut edited = set[2].clone();
        edited.date = date(2024, 2, 1);
        edited.amount = Money::zero();

        apply_edits(&mut set, &[edited], &BTreeSet::new());
        assert_eq!(set[2].month.to_string(), "2024-02");
        assert_eq!(set[2].amount, Money::from_cents(-1000));
    }

    #[test]
    fn date_edit_outside_four_digit_years_keeps_prior_date() {
        let mut set = canonical();
        let mut edited = set[0].clone();
        edited.date = date(10000, 1, 1);
        edited.description = "IFOOD *Pedido".to_string();

        let summary = apply_edits(&mut set, &[edited], &BTreeSet::new());
        assert_eq!(summary.updated, 1);
        assert_eq!(set[0].date, date(2024, 1, 10));
        assert_eq!(set[0].month.to_string(), "2024-01");
        assert_eq!(set[0].description, "IFOOD *Pedido");
    }
}
