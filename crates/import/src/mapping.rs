use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::table::{Cell, RawTable};

/// Binds the canonical fields to column names of one uploaded table.
/// A new upload needs a new mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub date: Option<String>,
    pub title: Option<String>,
    pub amount: Option<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("Column mapping incomplete, missing: {}", .0.join(", "))]
    Incomplete(Vec<&'static str>),
    #[error("Column '{0}' is mapped to more than one field")]
    DuplicateColumn(String),
    #[error("Column not found in file: {0}")]
    UnknownColumn(String),
}

/// One row of the mapped table, still untyped.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CanonicalRow {
    pub date: Cell,
    pub title: Cell,
    pub amount: Cell,
}

impl ColumnMapping {
    pub fn new(date: &str, title: &str, amount: &str) -> Self {
        ColumnMapping {
            date: Some(date.to_string()),
            title: Some(title.to_string()),
            amount: Some(amount.to_string()),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.validate().is_ok()
    }

    /// All three fields bound, to three different columns.
    pub fn validate(&self) -> Result<(&str, &str, &str), MappingError> {
        fn bound(field: &Option<String>) -> Option<&str> {
            field.as_deref().map(str::trim).filter(|s| !s.is_empty())
        }
        let (date, title, amount) = (bound(&self.date), bound(&self.title), bound(&self.amount));

        let missing: Vec<&'static str> = [("date", date), ("title", title), ("amount", amount)]
            .into_iter()
            .filter(|(_, col)| col.is_none())
            .map(|(name, _)| name)
            .collect();

        match (date, title, amount) {
            (Some(d), Some(t), Some(a)) => {
                if d == t || d == a {
                    Err(MappingError::DuplicateColumn(d.to_string()))
                } else if t == a {
                    Err(MappingError::DuplicateColumn(t.to_string()))
                } else {
                    Ok((d, t, a))
                }
            }
            _ => Err(MappingError::Incomplete(missing)),
        }
    }
}

/// Keeps only the three mapped columns, renamed to date/title/amount.
/// Values are not converted here.
pub fn apply_mapping(table: &RawTable, mapping: &ColumnMapping) -> Result<Vec<CanonicalRow>, MappingError> {
    let (date, title, amount) = mapping.validate()?;
    let index = |name: &str| {
        table
            .column_index(name)
            .ok_or_else(|| MappingError::UnknownColumn(name.to_string()))
    };
    let (date_idx, title_idx, amount_idx) = (index(date)?, index(title)?, index(amount)?);

    let cell = |row: &[Cell], idx: usize| row.get(idx).cloned().unwrap_or_default();
    Ok(table
        .rows()
        .iter()
        .map(|row| CanonicalRow {
            date: cell(row, date_idx),
            title: cell(row, title_idx),
            amount: cell(row, amount_idx),
        })
        .collect())
}
