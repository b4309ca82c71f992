use crate::error::TipError;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const INVALID_AMOUNT_MESSAGE: &str = "Amount must be at least 1 KES.";

/// A tip in whole currency units. Always `>= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct TipAmount(u64);

impl TipAmount {
    pub fn new(value: u64) -> Result<Self, TipError> {
        if value >= 1 {
            Ok(Self(value))
        } else {
            Err(invalid())
        }
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for TipAmount {
    type Error = TipError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<Decimal> for TipAmount {
    type Error = TipError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        if !value.fract().is_zero() {
            return Err(invalid());
        }
        value.to_u64().ok_or_else(invalid).and_then(Self::new)
    }
}

impl From<TipAmount> for u64 {
    fn from(amount: TipAmount) -> Self {
        amount.0
    }
}

impl fmt::Display for TipAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validates amount text as typed by the user or read off the wire.
///
/// The text must parse as a number, carry no fractional part and be at
/// least 1. `"100"` and `"100.0"` are both accepted.
pub fn validate_amount(input: &str) -> Result<TipAmount, TipError> {
    let value = Decimal::from_str(input.trim()).map_err(|_| invalid())?;
    TipAmount::try_from(value)
}

/// Keeps only the ASCII digits of a custom amount entry.
pub fn sanitize_custom_amount(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

fn invalid() -> TipError {
    TipError::InvalidAmount(INVALID_AMOUNT_MESSAGE.to_string())
}
