//! Scoring - Rubric aggregation
//!
//! Pure functions from scored answers to category results and an overall
//! recommendation. Deterministic given inputs: recomputing from the same
//! scored answers always yields the same assessment result.

use chrono::{DateTime, Utc};

use crate::domain::entities::{AssessmentResult, CategoryResult, Role, ScoredAnswer};
use crate::domain::value_objects::{Recommendation, RecommendationPolicy};

/// Aggregate scored answers into per-category results, in the role's
/// category order.
pub fn category_results(role: &Role, answers: &[ScoredAnswer]) -> Vec<CategoryResult> {
    role.categories
        .iter()
        .map(|category| {
            let questions = role.questions_in_category(&category.key);
            let mut total_score = 0.0;
            let mut total_max = 0.0;
            let mut count = 0usize;
            let mut degraded = false;

            for question in &questions {
                total_max += question.rubric.max_score();
                if let Some(answer) = answers.iter().find(|a| a.question_key == question.key) {
                    total_score += answer.score;
                    count += 1;
                    degraded |= answer.is_degraded();
                }
            }

            let average_score = if count > 0 {
                total_score / count as f64
            } else {
                0.0
            };
            let percentage = if total_max > 0.0 {
                (total_score / total_max) * 100.0
            } else {
                0.0
            };

            CategoryResult {
                category: category.key.clone(),
                name: category.name.clone(),
                average_score,
                percentage,
                pass_threshold_pct: category.pass_threshold_pct,
                passed: percentage >= category.pass_threshold_pct,
                degraded,
            }
        })
        .collect()
}

/// Overall recommendation from category outcomes.
///
/// A degraded result (any evaluation failure) is REVIEW under every policy;
/// partial evaluation failures must never surface as a clean PASS or FAIL.
pub fn recommend(
    policy: RecommendationPolicy,
    categories: &[CategoryResult],
    degraded: bool,
) -> Recommendation {
    if degraded {
        return Recommendation::Review;
    }

    let total = categories.len();
    let failed = categories.iter().filter(|c| !c.passed).count();

    match policy {
        RecommendationPolicy::MixedReview => {
            if failed == 0 {
                Recommendation::Pass
            } else if failed == total {
                Recommendation::Fail
            } else {
                Recommendation::Review
            }
        }
        RecommendationPolicy::MajorityFail => {
            if failed == 0 {
                Recommendation::Pass
            } else if failed * 2 > total {
                Recommendation::Fail
            } else {
                Recommendation::Review
            }
        }
    }
}

/// Assemble the final assessment result for a session.
pub fn assemble(
    assessment_id: &str,
    role: &Role,
    answers: Vec<ScoredAnswer>,
    analyzed_at: DateTime<Utc>,
) -> AssessmentResult {
    let degraded = answers.iter().any(|a| a.is_degraded());
    let categories = category_results(role, &answers);
    let recommendation = recommend(role.recommendation_policy, &categories, degraded);

    let reasoning = build_reasoning(&categories, recommendation, degraded);

    AssessmentResult {
        assessment_id: assessment_id.to_string(),
        role: role.key.clone(),
        recommendation,
        reasoning,
        answers,
        categories,
        degraded,
        analyzed_at,
    }
}

fn build_reasoning(
    categories: &[CategoryResult],
    recommendation: Recommendation,
    degraded: bool,
) -> String {
    let mut parts: Vec<String> = categories
        .iter()
        .map(|c| {
            format!(
                "{}: {:.0}% ({})",
                c.name,
                c.percentage,
                if c.passed { "pass" } else { "fail" }
            )
        })
        .collect();
    if degraded {
        parts.push("one or more answers could not be evaluated".to_string());
    }
    format!("{recommendation}: {}", parts.join("; "))
}
