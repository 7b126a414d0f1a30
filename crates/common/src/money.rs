//! Fixed-point money amounts.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Money amount held in cents so that sums and products stay exact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money {
    cents: i64,
}

/// Error returned when an amount leaves the representable range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Money amount out of range")]
pub struct MoneyOverflow;

/// Error returned when a decimal amount string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid money amount: {input:?}")]
pub struct ParseMoneyError {
    input: String,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Creates a new Money amount from whole currency units, saturating at
    /// the representable range.
    pub fn from_units(units: i64) -> Self {
        Self {
            cents: units.saturating_mul(100),
        }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the whole-unit portion.
    pub fn units(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the cents portion (remainder after whole units).
    pub fn cents_part(&self) -> i64 {
        self.cents.abs() % 100
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.cents == 0
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }

    /// Multiplies by a quantity, saturating at the representable range.
    ///
    /// Use [`try_multiply`](Money::try_multiply) where an out-of-range
    /// amount must be rejected.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money {
            cents: self.cents.saturating_mul(i64::from(quantity)),
        }
    }

    /// Multiplies by a quantity, failing if the result is out of range.
    pub fn try_multiply(&self, quantity: u32) -> Result<Money, MoneyOverflow> {
        self.cents
            .checked_mul(i64::from(quantity))
            .map(Money::from_cents)
            .ok_or(MoneyOverflow)
    }

    /// Adds two amounts, failing if the result is out of range.
    pub fn try_add(&self, rhs: Money) -> Result<Money, MoneyOverflow> {
        self.cents
            .checked_add(rhs.cents)
            .map(Money::from_cents)
            .ok_or(MoneyOverflow)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.cents < 0 { "-" } else { "" };
        write!(f, "{sign}${}.{:02}", self.units().abs(), self.cents_part())
    }
}

impl std::str::FromStr for Money {
    type Err = ParseMoneyError;

    /// Parses `"12"`, `"12.3"` or `"12.34"` (an optional leading `$` is allowed).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseMoneyError {
            input: s.to_string(),
        };

        let trimmed = s.trim();
        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let rest = rest.strip_prefix('$').unwrap_or(rest);

        let (units, fraction) = match rest.split_once('.') {
            Some((units, fraction)) => (units, fraction),
            None => (rest, ""),
        };

        if units.is_empty() || !units.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        if fraction.len() > 2 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }

        let units: i64 = units.parse().map_err(|_| err())?;
        let fraction_cents: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| err())? * 10,
            _ => fraction.parse().map_err(|_| err())?,
        };

        let cents = units
            .checked_mul(100)
            .and_then(|c| c.checked_add(fraction_cents))
            .ok_or_else(err)?;

        Ok(Money::from_cents(if negative { -cents } else { cents }))
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents.saturating_add(rhs.cents),
        }
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents.saturating_sub(rhs.cents),
        }
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.cents = self.cents.saturating_add(rhs.cents);
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}
