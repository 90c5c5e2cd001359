//! Evaluator Port
//!
//! Abstract interface for the LLM grading capability. The evaluator is an
//! untrusted component: verdicts carry the stable question key, and the
//! scoring engine validates the returned key set against the expected set
//! before accepting any result. Identity is never inferred from position.

use async_trait::async_trait;

use crate::domain::{DomainError, Rubric};

/// One grading request: a question's rubric plus the verbatim transcript.
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    /// Stable question key, echoed back in the verdict.
    pub question_key: String,
    pub question: String,
    pub rubric: Rubric,
    pub transcript: String,
}

/// One grading verdict as returned by the evaluator.
///
/// The tier is kept as the raw label here; normalization (and rejection of
/// anything outside the four rubric tiers) happens in the scoring engine so
/// that a malformed verdict degrades that one answer instead of being
/// silently coerced.
#[derive(Debug, Clone)]
pub struct EvaluationVerdict {
    pub question_key: String,
    pub tier: String,
    pub reasoning: String,
}

/// LLM grading capability
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Evaluate a batch of answers for one role. Implementations must echo
    /// each request's question key in the corresponding verdict. Fails with
    /// [`DomainError::EvaluationUnavailable`] when the capability is
    /// unreachable or its output cannot be parsed at all.
    async fn evaluate(
        &self,
        role_name: &str,
        requests: &[EvaluationRequest],
    ) -> Result<Vec<EvaluationVerdict>, DomainError>;
}
