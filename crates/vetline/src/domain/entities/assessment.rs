//! Assessment Results
//!
//! Output of the scoring engine for one completed call session. Created
//! once, written to the result publisher, read-only afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{Recommendation, Tier};

/// Result of evaluating one answer transcript against its rubric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredAnswer {
    /// Stable question key; never inferred from position.
    pub question_key: String,
    pub tier: Tier,
    pub score: f64,
    pub reasoning: String,
}

impl ScoredAnswer {
    pub fn no_response(question_key: &str) -> Self {
        Self {
            question_key: question_key.to_string(),
            tier: Tier::NoResponse,
            score: 0.0,
            reasoning: "no answer was given".to_string(),
        }
    }

    pub fn evaluation_error(question_key: &str, detail: &str) -> Self {
        Self {
            question_key: question_key.to_string(),
            tier: Tier::EvaluationError,
            score: 0.0,
            reasoning: format!("evaluation failed: {detail}"),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.tier == Tier::EvaluationError
    }
}

/// Aggregate of scored answers within one category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryResult {
    pub category: String,
    pub name: String,
    pub average_score: f64,
    /// Average score as a percentage of the category maximum.
    pub percentage: f64,
    pub pass_threshold_pct: f64,
    pub passed: bool,
    /// True when any answer in this category carries the failure marker;
    /// the numbers above are then of reduced confidence.
    pub degraded: bool,
}

/// Full scoring output for one call session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub assessment_id: String,
    pub role: String,
    pub recommendation: Recommendation,
    pub reasoning: String,
    pub answers: Vec<ScoredAnswer>,
    pub categories: Vec<CategoryResult>,
    /// True when any answer failed evaluation; such a result is always
    /// flagged REVIEW, never a clean PASS or FAIL.
    pub degraded: bool,
    pub analyzed_at: DateTime<Utc>,
}

/// Summary record appended to the global index on completion, enabling
/// discovery without enumerating result storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub assessment_id: String,
    pub role: String,
    /// Lowercased recommendation, or "failed" when scoring aborted.
    pub status: String,
    pub analyzed_at: DateTime<Utc>,
}

impl IndexEntry {
    pub fn scored(result: &AssessmentResult) -> Self {
        Self {
            assessment_id: result.assessment_id.clone(),
            role: result.role.clone(),
            status: result.recommendation.to_string().to_lowercase(),
            analyzed_at: result.analyzed_at,
        }
    }

    pub fn failed(assessment_id: &str, role: &str) -> Self {
        Self {
            assessment_id: assessment_id.to_string(),
            role: role.to_string(),
            status: "failed".to_string(),
            analyzed_at: Utc::now(),
        }
    }
}
