use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub};
use std::str::FromStr;
use thiserror::Error;

/// Signed amount rounded to cents. Negative values are expenses.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Money(Decimal);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("Empty amount")]
    Empty,
    #[error("Invalid amount: {0}")]
    Invalid(String),
}

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    pub fn from_decimal(decimal: Decimal) -> Self {
        Money(decimal.round_dp(2))
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn abs(self) -> Self {
        Money(self.0.abs())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Self;
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |a, b| a + b)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Parses a value typed by the user into a form field.
///
/// Accepts either `.` or `,` as the decimal separator and an optional
/// `R$`/`$` prefix, e.g. `"25,50"`, `"R$ 1200.00"`, `"-3,1"`, `"R$ -3,1"`.
/// A lone dot followed by exactly three digits groups thousands, so
/// `"1.500"` is fifteen hundred while `"1,500"` is one and a half.
pub fn parse_decimal_input(text: &str) -> Result<Money, MoneyError> {
    let trimmed = text.trim();
    let invalid = || MoneyError::Invalid(trimmed.to_string());
    let (before_prefix, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, trimmed),
    };
    let rest = rest
        .strip_prefix("R$")
        .or_else(|| rest.strip_prefix('$'))
        .unwrap_or(rest)
        .trim();
    let (negative, rest) = match rest.strip_prefix('-') {
        Some(_) if before_prefix => return Err(invalid()),
        Some(after) => (true, after.trim_start()),
        None => (before_prefix, rest),
    };

    if rest.is_empty() {
        return Err(MoneyError::Empty);
    }

    let normalized = match rest.split_once('.') {
        Some((int, frac))
            if (1..=3).contains(&int.len())
                && !int.starts_with('0')
                && frac.len() == 3
                && frac.chars().all(|c| c.is_ascii_digit()) =>
        {
            format!("{int}{frac}")
        }
        _ => rest.replace(',', "."),
    };
    if normalized.matches('.').count() > 1 || normalized.starts_with(['-', '+']) {
        return Err(invalid());
    }

    let value = Decimal::from_str(&normalized).map_err(|_| invalid())?;
    Ok(Money::from_decimal(if negative { -value } else { value }))
}
