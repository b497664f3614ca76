use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use saldo_core::{Money, MonthBucket, Source, DEFAULT_DATE_FORMATS};
use std::str::FromStr;

use crate::table::Cell;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Row entering normalization, from either source.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub date: Cell,
    pub description: Cell,
    pub amount: Cell,
    pub source: Source,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    UnparseableDate(String),
    UnparseableAmount(String),
    ZeroAmount,
}

/// Normalized row, not yet categorized.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub date: NaiveDate,
    pub description: String,
    pub amount: Money,
    pub month: MonthBucket,
    pub source: Source,
}

impl NormalizedRow {
    pub fn spend(&self) -> Money {
        self.amount.abs()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Parsed(NormalizedRow),
    Dropped(DropReason),
}

/// Turns raw rows into typed rows. Rows with an unparseable date, an
/// unparseable amount or a zero amount are dropped; statement exports
/// routinely carry footer and summary lines, so this is not an error.
#[derive(Debug, Clone)]
pub struct TransactionNormalizer {
    date_formats: Vec<String>,
}

impl Default for TransactionNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect())
    }
}

impl TransactionNormalizer {
    /// `date_formats` are tried in order before the built-in date-time forms.
    pub fn new(date_formats: Vec<String>) -> Self {
        Self { date_formats }
    }

    pub fn parse(&self, record: &RawRecord) -> ParseOutcome {
        // A year with no YYYY-MM form counts as an unparseable date.
        let Some((date, month)) = self
            .parse_date(&record.date)
            .and_then(|d| Some((d, MonthBucket::from_date(d)?)))
        else {
            return ParseOutcome::Dropped(DropReason::UnparseableDate(record.date.to_string()));
        };
        let Some(amount) = parse_amount_cell(&record.amount) else {
            return ParseOutcome::Dropped(DropReason::UnparseableAmount(record.amount.to_string()));
        };
        if amount.is_zero() {
            return ParseOutcome::Dropped(DropReason::ZeroAmount);
        }
        ParseOutcome::Parsed(NormalizedRow {
            date,
            description: record.description.to_string(),
            amount,
            month,
            source: record.source,
        })
    }

    /// Only the rows that survived.
    pub fn normalize(&self, records: &[RawRecord]) -> Vec<NormalizedRow> {
        records
            .iter()
            .filter_map(|r| match self.parse(r) {
                ParseOutcome::Parsed(row) => Some(row),
                ParseOutcome::Dropped(reason) => {
                    tracing::debug!(?reason, "dropped row");
                    None
                }
            })
            .collect()
    }

    fn parse_date(&self, cell: &Cell) -> Option<NaiveDate> {
        match cell {
            Cell::Date(d) => Some(*d),
            Cell::DateTime(dt) => Some(dt.date()),
            Cell::Text(s) => self.parse_date_text(s.trim()),
            Cell::Empty | Cell::Number(_) => None,
        }
    }

    fn parse_date_text(&self, s: &str) -> Option<NaiveDate> {
        if s.is_empty() {
            return None;
        }
        for fmt in &self.date_formats {
            if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
                return Some(date);
            }
        }
        for fmt in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(dt.date());
            }
        }
        // Offsets are discarded: dates are timezone-naive.
        DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.naive_local().date())
    }
}

fn parse_amount_cell(cell: &Cell) -> Option<Money> {
    match cell {
        Cell::Number(n) => Some(Money::from_decimal(*n)),
        Cell::Text(s) => parse_amount(s).map(Money::from_decimal),
        Cell::Empty | Cell::Date(_) | Cell::DateTime(_) => None,
    }
}

/// Parses an amount as found in statement exports: `-1,234.56`,
/// `-1.234,56`, `R$ 25,50`, `R$ -25,50`, `(75.25)`, `1.500`.
fn parse_amount(s: &str) -> Option<Decimal> {
    let s = s.trim();
    let (mut negative, s) = if s.starts_with('(') && s.ends_with(')') {
        (true, &s[1..s.len() - 1])
    } else {
        (false, s)
    };
    let s = s.trim();
    let (before_prefix, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, s),
    };
    let s = s
        .strip_prefix("R$")
        .or_else(|| s.strip_prefix('$'))
        .unwrap_or(s)
        .trim_start();
    // One minus sign, either side of the currency prefix.
    let (after_prefix, s) = match s.strip_prefix('-') {
        Some(rest) if !before_prefix => (true, rest),
        _ => (false, s),
    };
    negative ^= before_prefix || after_prefix;

    let s: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    if s.is_empty() || s.starts_with(['-', '+']) {
        return None;
    }

    let cleaned = match (s.rfind(','), s.rfind('.')) {
        // Whichever separator comes last is the decimal one.
        (Some(comma), Some(dot)) if comma > dot => s.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => s.replace(',', ""),
        (Some(_), None) if s.matches(',').count() > 1 || is_thousands_group(&s, ',') => {
            s.replace(',', "")
        }
        (Some(_), None) => s.replace(',', "."),
        (None, Some(_)) if s.matches('.').count() > 1 || is_thousands_group(&s, '.') => {
            s.replace('.', "")
        }
        _ => s,
    };

    let value = Decimal::from_str(&cleaned).ok()?;
    Some(if negative { -value } else { value })
}

/// `1.500` or `12,000`: a single separator with one to three leading digits
/// (not starting with zero) and exactly three after it.
fn is_thousands_group(s: &str, sep: char) -> bool {
    let Some((int, frac)) = s.split_once(sep) else {
        return false;
    };
    (1..=3).contains(&int.len())
        && !int.starts_with('0')
        && frac.len() == 3
        && int.chars().chain(frac.chars()).all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(date: &str, desc: &str, amount: &str) -> RawRecord {
        RawRecord {
            date: Cell::from(date),
            description: Cell::from(desc),
            amount: Cell::from(amount),
            source: Source::Uploaded,
        }
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    // ── parse_amount ──────────────────────────────────────────────────────────

    #[test]
    fn parse_amount_plain_and_negative() {
        assert_eq!(parse_amount("123.45"), Some(dec("123.45")));
        assert_eq!(parse_amount("-50.00"), Some(dec("-50")));
        assert_eq!(parse_amount("100"), Some(dec("100")));
    }

    #[test]
    fn parse_amount_decimal_comma() {
        assert_eq!(parse_amount("-32,90"), Some(dec("-32.90")));
        assert_eq!(parse_amount("1.234,56"), Some(dec("1234.56")));
        assert_eq!(parse_amount("R$ 25,50"), Some(dec("25.50")));
        assert_eq!(parse_amount("-R$ 25,50"), Some(dec("-25.50")));
    }

    #[test]
    fn parse_amount_thousands_separators() {
        assert_eq!(parse_amount("1,234.56"), Some(dec("1234.56")));
        assert_eq!(parse_amount("$1,234"), Some(dec("1234")));
        assert_eq!(parse_amount("1.234.567"), Some(dec("1234567")));
    }

    #[test]
    fn parse_amount_sign_after_currency_prefix() {
        assert_eq!(parse_amount("R$ -25,50"), Some(dec("-25.50")));
        assert_eq!(parse_amount("$-12.00"), Some(dec("-12")));
        assert_eq!(parse_amount("R$-1.234,56"), Some(dec("-1234.56")));
        assert_eq!(parse_amount("-R$ -5"), None);
        assert_eq!(parse_amount("R$ +5"), None);
    }

    #[test]
    fn parse_amount_single_dot_thousands() {
        assert_eq!(parse_amount("1.500"), Some(dec("1500")));
        assert_eq!(parse_amount("-12.000"), Some(dec("-12000")));
        assert_eq!(parse_amount("R$ 1.500"), Some(dec("1500")));
        // leading zero or a long integer part reads as a decimal
        assert_eq!(parse_amount("0.500"), Some(dec("0.5")));
        assert_eq!(parse_amount("1500.000"), Some(dec("1500")));
        assert_eq!(parse_amount("1.5"), Some(dec("1.5")));
        assert_eq!(parse_amount("0,750"), Some(dec("0.75")));
    }

    #[test]
    fn parse_amount_accounting_parens() {
        assert_eq!(parse_amount("(75.25)"), Some(dec("-75.25")));
    }

    #[test]
    fn parse_amount_invalid() {
        assert_eq!(parse_amount("not_a_number"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("Total"), None);
        assert_eq!(parse_amount("--5"), None);
    }

    // ── dates ─────────────────────────────────────────────────────────────────

    #[test]
    fn dates_in_common_layouts() {
        let n = TransactionNormalizer::default();
        assert_eq!(n.parse_date(&Cell::from("2024-01-15")), Some(date(2024, 1, 15)));
        assert_eq!(n.parse_date(&Cell::from("15/01/2024")), Some(date(2024, 1, 15)));
        assert_eq!(n.parse_date(&Cell::from("2024-01-15 10:22:01")), Some(date(2024, 1, 15)));
        assert_eq!(n.parse_date(&Cell::from("2024-01-15T23:30:00-03:00")), Some(date(2024, 1, 15)));
        assert_eq!(n.parse_date(&Cell::Date(date(2024, 2, 1))), Some(date(2024, 2, 1)));
    }

    #[test]
    fn day_first_wins_over_month_first_by_default() {
        let n = TransactionNormalizer::default();
        assert_eq!(n.parse_date(&Cell::from("02/03/2024")), Some(date(2024, 3, 2)));
        // only valid month-first
        assert_eq!(n.parse_date(&Cell::from("03/25/2024")), Some(date(2024, 3, 25)));
    }

    #[test]
    fn custom_formats_are_tried_first() {
        let n = TransactionNormalizer::new(vec!["%m/%d/%Y".to_string()]);
        assert_eq!(n.parse_date(&Cell::from("02/03/2024")), Some(date(2024, 2, 3)));
    }

    #[test]
    fn undated_cells_fail() {
        let n = TransactionNormalizer::default();
        assert_eq!(n.parse_date(&Cell::from("Saldo anterior")), None);
        assert_eq!(n.parse_date(&Cell::Empty), None);
        assert_eq!(n.parse_date(&Cell::Number(dec("45000"))), None);
    }

    // ── rows ──────────────────────────────────────────────────────────────────

    #[test]
    fn parse_keeps_valid_row() {
        let n = TransactionNormalizer::default();
        match n.parse(&record("2024-01-15", "IFOOD *Pedido", "-32,90")) {
            ParseOutcome::Parsed(row) => {
                assert_eq!(row.date, date(2024, 1, 15));
                assert_eq!(row.description, "IFOOD *Pedido");
                assert_eq!(row.amount, Money::from_cents(-3290));
                assert_eq!(row.spend(), Money::from_cents(3290));
                assert_eq!(row.month.to_string(), "2024-01");
            }
            other => panic!("expected a parsed row, got {other:?}"),
        }
    }

    #[test]
    fn parse_reports_drop_reasons() {
        let n = TransactionNormalizer::default();
        assert_eq!(
            n.parse(&record("Total", "", "-10")),
            ParseOutcome::Dropped(DropReason::UnparseableDate("Total".into()))
        );
        assert_eq!(
            n.parse(&record("2024-01-01", "x", "abc")),
            ParseOutcome::Dropped(DropReason::UnparseableAmount("abc".into()))
        );
        assert_eq!(
            n.parse(&record("2024-01-01", "x", "0,00")),
            ParseOutcome::Dropped(DropReason::ZeroAmount)
        );
    }

    #[test]
    fn dates_beyond_four_digit_years_are_dropped() {
        let n = TransactionNormalizer::new(vec!["%Y-%m-%d".to_string()]);
        assert_eq!(
            n.parse(&record("+10000-01-01", "x", "-10")),
            ParseOutcome::Dropped(DropReason::UnparseableDate("+10000-01-01".into()))
        );
        let far = RawRecord {
            date: Cell::Date(date(-5, 6, 1)),
            description: Cell::from("x"),
            amount: Cell::Number(dec("-10")),
            source: Source::Manual,
        };
        assert!(matches!(
            n.parse(&far),
            ParseOutcome::Dropped(DropReason::UnparseableDate(_))
        ));
        assert!(matches!(
            n.parse(&record("9999-12-31", "x", "-10")),
            ParseOutcome::Parsed(_)
        ));
    }

    #[test]
    fn normalize_keeps_every_valid_row_once() {
        let n = TransactionNormalizer::default();
        let rows = n.normalize(&[
            record("2024-01-01", "a", "-1"),
            record("", "footer", "-1"),
            record("2024-01-02", "b", ""),
            record("2024-01-03", "c", "0"),
            record("2024-01-04", "d", "2,50"),
        ]);
        let descs: Vec<&str> = rows.iter().map(|r| r.description.as_str()).collect();
        assert_eq!(descs, ["a", "d"]);
    }

    #[test]
    fn non_text_description_is_coerced() {
        let n = TransactionNormalizer::default();
        let rec = RawRecord {
            date: Cell::from("2024-01-01"),
            description: Cell::Number(dec("99")),
            amount: Cell::Number(dec("-10")),
            source: Source::Uploaded,
        };
        let rows = n.normalize(&[rec]);
        assert_eq!(rows[0].description, "99");
        assert_eq!(rows[0].amount, Money::from_cents(-1000));
    }
}
