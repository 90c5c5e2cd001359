//! PhoneNumber - E.164 candidate phone number

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// A validated, E.164-normalized phone number.
///
/// Accepts common human formatting (dashes, spaces, parentheses) and a
/// missing leading `+`, normalizing to `+<digits>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let stripped: String = raw
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '.'))
            .collect();

        let digits = stripped.strip_prefix('+').unwrap_or(&stripped);

        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(DomainError::InvalidRequest(format!(
                "phone number contains non-digit characters: {raw}"
            )));
        }
        if !(8..=15).contains(&digits.len()) {
            return Err(DomainError::InvalidRequest(format!(
                "phone number must have 8-15 digits, got {}",
                digits.len()
            )));
        }

        Ok(Self(format!("+{digits}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last four digits, used in human-readable assessment ids.
    pub fn last_four(&self) -> &str {
        let digits = &self.0[1..];
        &digits[digits.len().saturating_sub(4)..]
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
