//! Transcription Port
//!
//! Abstract interface for the speech-to-text capability used during
//! post-call analysis.

use async_trait::async_trait;

use crate::domain::DomainError;

/// Speech-to-text capability
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe one stored recording. Fails with
    /// [`DomainError::TranscriptionUnavailable`] when the capability is
    /// unreachable or the job fails.
    async fn transcribe(&self, recording_url: &str) -> Result<String, DomainError>;
}
