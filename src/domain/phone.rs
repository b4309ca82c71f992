use crate::error::TipError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inline message shown next to the phone field when validation fails.
pub const INVALID_PHONE_MESSAGE: &str =
    "Please enter a valid Safaricom number (e.g. 07... or 01...).";

pub const COUNTRY_CODE: &str = "254";

const LOCAL_DIGITS: usize = 9;

// Longest prefix first so "+254" never degrades into a bare "254" match.
const ACCEPTED_PREFIXES: [&str; 3] = ["+254", "254", "0"];

/// A Safaricom number in canonical `254XXXXXXXXX` form.
///
/// Only [`validate_phone`] constructs this type, so holding one means the
/// number passed `^(254|\+254|0)?(7\d{8}|1\d{8})$` after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NormalizedPhone(String);

impl NormalizedPhone {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The nine subscriber digits without the country code.
    pub fn local_part(&self) -> &str {
        &self.0[COUNTRY_CODE.len()..]
    }

    /// Log-safe rendering, e.g. `2547****5678`.
    pub fn masked(&self) -> String {
        let head = &self.0[..4];
        let tail = &self.0[self.0.len() - 4..];
        format!("{head}****{tail}")
    }
}

impl fmt::Display for NormalizedPhone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for NormalizedPhone {
    type Error = TipError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_phone(&value)
    }
}

impl From<NormalizedPhone> for String {
    fn from(phone: NormalizedPhone) -> Self {
        phone.0
    }
}

/// Normalizes a user-entered Kenyan mobile number.
///
/// Accepts an optional `254`, `+254` or `0` prefix followed by exactly nine
/// digits starting with `7` or `1`. Anything else is rejected rather than
/// guessed at.
pub fn validate_phone(input: &str) -> Result<NormalizedPhone, TipError> {
    let trimmed = input.trim();

    ACCEPTED_PREFIXES
        .iter()
        .filter_map(|prefix| trimmed.strip_prefix(prefix))
        .chain(std::iter::once(trimmed))
        .find(|rest| is_subscriber_number(rest))
        .map(|rest| NormalizedPhone(format!("{COUNTRY_CODE}{rest}")))
        .ok_or_else(|| TipError::InvalidPhone(INVALID_PHONE_MESSAGE.to_string()))
}

fn is_subscriber_number(digits: &str) -> bool {
    digits.len() == LOCAL_DIGITS
        && digits.bytes().all(|b| b.is_ascii_digit())
        && matches!(digits.as_bytes()[0], b'7' | b'1')
}
