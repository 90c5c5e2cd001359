//! CallSession - Durable record of one phone assessment
//!
//! Owned exclusively by the call-flow state machine; the session store is
//! its only persistence mechanism. No in-memory state survives between
//! webhook invocations, so every field needed to resume the call lives here.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::Role;
use crate::domain::errors::DomainError;
use crate::domain::value_objects::PhoneNumber;

/// Lifecycle status of a call session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
    Failed,
    Abandoned,
}

impl SessionStatus {
    /// Terminal sessions are never mutated again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Abandoned => write!(f, "abandoned"),
        }
    }
}

/// What the candidate produced for one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseRecord {
    /// Provider recording reference, absent for a no-response marker.
    pub recording_url: Option<String>,
    /// Transcript, attached post-call by the scoring pipeline.
    pub transcript: Option<String>,
    /// Explicit marker that the candidate gave no answer.
    #[serde(default)]
    pub no_response: bool,
    pub answered_at: DateTime<Utc>,
}

impl ResponseRecord {
    pub fn answered(recording_url: String, at: DateTime<Utc>) -> Self {
        Self {
            recording_url: Some(recording_url),
            transcript: None,
            no_response: false,
            answered_at: at,
        }
    }

    pub fn no_response(at: DateTime<Utc>) -> Self {
        Self {
            recording_url: None,
            transcript: None,
            no_response: true,
            answered_at: at,
        }
    }

    /// A slot counts as resolved once it holds either a recording or an
    /// explicit no-response marker.
    pub fn is_resolved(&self) -> bool {
        self.no_response || self.recording_url.is_some()
    }
}

/// One in-progress or completed phone assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSession {
    /// Assessment identifier, e.g. "bartender_20260807_143000_4567".
    pub id: String,
    /// Call identifier assigned by the telephony provider.
    pub provider_call_id: Option<String>,
    pub role: String,
    pub candidate_phone: String,
    pub candidate_id: Option<String>,
    /// Index into the role's question sequence. Only ever advances.
    pub current_question_index: usize,
    /// Per-question response records, keyed by stable question key.
    pub responses: BTreeMap<String, ResponseRecord>,
    /// Per-question repeat counters.
    pub repeats: BTreeMap<String, u32>,
    /// Per-question silence counters.
    pub timeouts: BTreeMap<String, u32>,
    pub status: SessionStatus,
    /// Optimistic-concurrency token, bumped by the store on every write.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Human-readable assessment id: role, timestamp, last four phone digits.
pub fn assessment_id(role_key: &str, phone: &PhoneNumber, now: DateTime<Utc>) -> String {
    format!(
        "{}_{}_{}",
        role_key,
        now.format("%Y%m%d_%H%M%S"),
        phone.last_four()
    )
}

impl CallSession {
    pub fn new(
        id: String,
        role: String,
        candidate_phone: PhoneNumber,
        candidate_id: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            provider_call_id: None,
            role,
            candidate_phone: candidate_phone.to_string(),
            candidate_id,
            current_question_index: 0,
            responses: BTreeMap::new(),
            repeats: BTreeMap::new(),
            timeouts: BTreeMap::new(),
            status: SessionStatus::InProgress,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_provider_call_id(mut self, call_id: String) -> Self {
        self.provider_call_id = Some(call_id);
        self
    }

    pub fn has_answered(&self, question_key: &str) -> bool {
        self.responses
            .get(question_key)
            .map(|r| r.is_resolved())
            .unwrap_or(false)
    }

    /// Attach a recording for a question. Overwrites nothing: an already
    /// resolved slot is left untouched so duplicate deliveries are harmless.
    pub fn record_answer(&mut self, question_key: &str, recording_url: String) {
        if !self.has_answered(question_key) {
            self.responses.insert(
                question_key.to_string(),
                ResponseRecord::answered(recording_url, Utc::now()),
            );
        }
    }

    /// Mark a question as explicitly unanswered.
    pub fn record_no_response(&mut self, question_key: &str) {
        if !self.has_answered(question_key) {
            self.responses.insert(
                question_key.to_string(),
                ResponseRecord::no_response(Utc::now()),
            );
        }
    }

    /// Move the pointer forward. The pointer never decreases.
    pub fn advance(&mut self) {
        self.current_question_index += 1;
    }

    pub fn repeat_count(&self, question_key: &str) -> u32 {
        self.repeats.get(question_key).copied().unwrap_or(0)
    }

    pub fn note_repeat(&mut self, question_key: &str) -> u32 {
        let count = self.repeats.entry(question_key.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    pub fn timeout_count(&self, question_key: &str) -> u32 {
        self.timeouts.get(question_key).copied().unwrap_or(0)
    }

    pub fn note_timeout(&mut self, question_key: &str) -> u32 {
        let count = self.timeouts.entry(question_key.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    /// Whether every question of the role has a recording or a no-response
    /// marker.
    pub fn all_questions_resolved(&self, role: &Role) -> bool {
        role.questions.iter().all(|q| self.has_answered(&q.key))
    }

    /// Transition to COMPLETED. Refused unless every question is resolved.
    pub fn mark_completed(&mut self, role: &Role) -> Result<(), DomainError> {
        if !self.all_questions_resolved(role) {
            return Err(DomainError::Validation(format!(
                "session {} cannot complete with unresolved questions",
                self.id
            )));
        }
        self.status = SessionStatus::Completed;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn mark_failed(&mut self) {
        self.status = SessionStatus::Failed;
        self.updated_at = Utc::now();
    }

    /// Hangup before completion: partial answers are preserved but the
    /// session is excluded from scoring.
    pub fn mark_abandoned(&mut self) {
        self.status = SessionStatus::Abandoned;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::tests_support::sample_role;

    fn session(role: &Role) -> CallSession {
        CallSession::new(
            "bartender_20260807_120000_4567".to_string(),
            role.key.clone(),
            PhoneNumber::parse("+15551234567").unwrap(),
            None,
        )
    }

    #[test]
    fn test_pointer_only_advances() {
        let role = sample_role();
        let mut s = session(&role);
        assert_eq!(s.current_question_index, 0);
        s.advance();
        s.advance();
        assert_eq!(s.current_question_index, 2);
    }

    #[test]
    fn test_duplicate_answer_does_not_overwrite() {
        let role = sample_role();
        let mut s = session(&role);
        s.record_answer("experience_1", "https://recordings/one.mp3".to_string());
        s.record_answer("experience_1", "https://recordings/two.mp3".to_string());
        assert_eq!(
            s.responses["experience_1"].recording_url.as_deref(),
            Some("https://recordings/one.mp3")
        );
    }

    #[test]
    fn test_completion_requires_all_resolved() {
        let role = sample_role();
        let mut s = session(&role);
        s.record_answer("experience_1", "https://recordings/one.mp3".to_string());
        assert!(s.mark_completed(&role).is_err());
        assert_eq!(s.status, SessionStatus::InProgress);

        s.record_no_response("knowledge_margarita");
        s.mark_completed(&role).unwrap();
        assert_eq!(s.status, SessionStatus::Completed);
        assert!(s.status.is_terminal());
    }

    #[test]
    fn test_assessment_id_format() {
        let phone = PhoneNumber::parse("+15551234567").unwrap();
        let now = chrono::DateTime::parse_from_rfc3339("2026-08-07T14:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(
            assessment_id("bartender", &phone, now),
            "bartender_20260807_143000_4567"
        );
    }
}
