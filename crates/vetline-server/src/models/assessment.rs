//! Assessment DTOs
//!
//! Read models for the dashboard surface.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use vetline::domain::{AssessmentResult, CategoryResult, IndexEntry, ScoredAnswer};

/// One index entry
#[derive(Debug, Serialize, ToSchema)]
pub struct AssessmentSummary {
    pub assessment_id: String,
    pub role: String,
    /// Lowercased recommendation, or "failed" when scoring aborted
    pub status: String,
    pub analyzed_at: DateTime<Utc>,
}

impl AssessmentSummary {
    pub fn from_domain(entry: IndexEntry) -> Self {
        Self {
            assessment_id: entry.assessment_id,
            role: entry.role,
            status: entry.status,
            analyzed_at: entry.analyzed_at,
        }
    }
}

/// The full index document
#[derive(Debug, Serialize, ToSchema)]
pub struct AssessmentIndexResponse {
    pub assessments: Vec<AssessmentSummary>,
    pub total_count: usize,
}

impl AssessmentIndexResponse {
    pub fn from_domain(entries: Vec<IndexEntry>) -> Self {
        let assessments: Vec<AssessmentSummary> = entries
            .into_iter()
            .map(AssessmentSummary::from_domain)
            .collect();
        Self {
            total_count: assessments.len(),
            assessments,
        }
    }
}

/// One scored answer
#[derive(Debug, Serialize, ToSchema)]
pub struct ScoredAnswerDto {
    pub question_key: String,
    pub tier: String,
    pub score: f64,
    pub reasoning: String,
}

impl ScoredAnswerDto {
    fn from_domain(answer: ScoredAnswer) -> Self {
        Self {
            question_key: answer.question_key,
            tier: answer.tier.to_string(),
            score: answer.score,
            reasoning: answer.reasoning,
        }
    }
}

/// One category aggregate
#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryResultDto {
    pub category: String,
    pub name: String,
    pub average_score: f64,
    pub percentage: f64,
    pub pass_threshold_pct: f64,
    pub passed: bool,
    pub degraded: bool,
}

impl CategoryResultDto {
    fn from_domain(category: CategoryResult) -> Self {
        Self {
            category: category.category,
            name: category.name,
            average_score: category.average_score,
            percentage: category.percentage,
            pass_threshold_pct: category.pass_threshold_pct,
            passed: category.passed,
            degraded: category.degraded,
        }
    }
}

/// Full assessment result
#[derive(Debug, Serialize, ToSchema)]
pub struct AssessmentResultResponse {
    pub assessment_id: String,
    pub role: String,
    pub recommendation: String,
    pub reasoning: String,
    pub answers: Vec<ScoredAnswerDto>,
    pub categories: Vec<CategoryResultDto>,
    pub degraded: bool,
    pub analyzed_at: DateTime<Utc>,
}

impl AssessmentResultResponse {
    pub fn from_domain(result: AssessmentResult) -> Self {
        Self {
            assessment_id: result.assessment_id,
            role: result.role,
            recommendation: result.recommendation.to_string(),
            reasoning: result.reasoning,
            answers: result
                .answers
                .into_iter()
                .map(ScoredAnswerDto::from_domain)
                .collect(),
            categories: result
                .categories
                .into_iter()
                .map(CategoryResultDto::from_domain)
                .collect(),
            degraded: result.degraded,
            analyzed_at: result.analyzed_at,
        }
    }
}
