//! Recommendation - Overall hiring verdict for one assessment

use serde::{Deserialize, Serialize};

/// Overall recommendation for a completed assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    /// Strong candidate, every category cleared its threshold
    Pass,
    /// Mixed or degraded results, needs human review
    Review,
    /// Candidate did not meet minimum requirements
    Fail,
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Review => write!(f, "REVIEW"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}

/// Policy for mapping category pass/fail outcomes to an overall
/// recommendation. Configured per role; rubric thresholds vary enough by
/// role that the boundary rule is data, not code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecommendationPolicy {
    /// PASS if every category passes, FAIL if none pass, REVIEW otherwise
    #[default]
    MixedReview,
    /// FAIL only when a strict majority of categories fail; any smaller
    /// mixed outcome is REVIEW
    MajorityFail,
}
