//! Domain Errors
//!
//! Error types for domain operations, matching the failure taxonomy of the
//! assessment pipeline: live-call failures, post-call scoring failures, and
//! configuration failures.

use thiserror::Error;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    /// Inbound webhook payload could not be interpreted.
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    /// No call session exists for the given identifier.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// The session store failed to read or write.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// A session write was applied against stale state.
    #[error("conflicting write for session {0}")]
    Conflict(String),

    /// The transcription capability failed or timed out.
    #[error("transcription unavailable: {0}")]
    TranscriptionUnavailable(String),

    /// The evaluation capability failed, timed out, or returned output
    /// that could not be validated.
    #[error("evaluation unavailable: {0}")]
    EvaluationUnavailable(String),

    /// A caller-supplied request failed validation.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A role definition or other static configuration is malformed.
    #[error("validation error: {0}")]
    Validation(String),

    /// An external collaborator (telephony provider, etc.) rejected a call.
    #[error("external service error: {0}")]
    ExternalService(String),
}

impl DomainError {
    pub fn session_not_found<T: AsRef<str>>(id: T) -> Self {
        Self::SessionNotFound(id.as_ref().to_string())
    }

    pub fn malformed<T: AsRef<str>>(detail: T) -> Self {
        Self::MalformedEvent(detail.as_ref().to_string())
    }
}
