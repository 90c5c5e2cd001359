//! Tier - Qualitative bucket assigned to an answer
//!
//! The rubric defines four tiers; `EvaluationError` is a fifth,
//! engine-assigned tier for answers whose evaluation failed. It is never a
//! legal evaluator verdict and never appears in rubric definitions.

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Qualitative tier for a scored answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    /// Answer matches the ideal criteria
    Ideal,
    /// Answer is acceptable but not ideal
    Acceptable,
    /// Answer shows a disqualifying gap
    RedFlag,
    /// The candidate gave no answer
    NoResponse,
    /// Evaluation failed for this answer; assigned by the scoring engine
    /// only, never by the evaluator
    EvaluationError,
}

impl Tier {
    /// Parse an evaluator-returned tier label.
    ///
    /// Only the four rubric tiers are accepted; anything else (including
    /// "evaluation-error") is rejected so that a misbehaving evaluator can
    /// never smuggle in a freeform verdict.
    pub fn parse_rubric(label: &str) -> Result<Self, DomainError> {
        match label.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "ideal" => Ok(Self::Ideal),
            "acceptable" => Ok(Self::Acceptable),
            "red-flag" | "redflag" => Ok(Self::RedFlag),
            "no-response" | "noresponse" => Ok(Self::NoResponse),
            other => Err(DomainError::EvaluationUnavailable(format!(
                "unknown tier label: {other}"
            ))),
        }
    }

    /// Whether this tier came out of the rubric (as opposed to an
    /// engine-assigned failure marker).
    pub fn is_rubric_tier(&self) -> bool {
        !matches!(self, Self::EvaluationError)
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ideal => write!(f, "ideal"),
            Self::Acceptable => write!(f, "acceptable"),
            Self::RedFlag => write!(f, "red-flag"),
            Self::NoResponse => write!(f, "no-response"),
            Self::EvaluationError => write!(f, "evaluation-error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rubric_accepts_four_tiers() {
        assert_eq!(Tier::parse_rubric("ideal").unwrap(), Tier::Ideal);
        assert_eq!(Tier::parse_rubric("ACCEPTABLE").unwrap(), Tier::Acceptable);
        assert_eq!(Tier::parse_rubric("red_flag").unwrap(), Tier::RedFlag);
        assert_eq!(Tier::parse_rubric(" no-response ").unwrap(), Tier::NoResponse);
    }

    #[test]
    fn test_parse_rubric_rejects_freeform() {
        assert!(Tier::parse_rubric("excellent").is_err());
        assert!(Tier::parse_rubric("").is_err());
        // The failure marker is not a valid evaluator verdict.
        assert!(Tier::parse_rubric("evaluation-error").is_err());
    }
}
