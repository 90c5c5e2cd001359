//! Speech-to-Text Adapter
//!
//! Sends a stored recording URL to the transcription API and extracts the
//! transcript text. All failures map to `TranscriptionUnavailable`; the
//! scoring engine degrades the affected question rather than aborting.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use vetline::domain::DomainError;
use vetline::ports::Transcriber;

use crate::config::TranscriptionConfig;

/// HTTP implementation of Transcriber
pub struct HttpTranscriber {
    client: Client,
    config: TranscriptionConfig,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    results: TranscriptionResults,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResults {
    channels: Vec<TranscriptionChannel>,
}

#[derive(Debug, Deserialize)]
struct TranscriptionChannel {
    alternatives: Vec<TranscriptionAlternative>,
}

#[derive(Debug, Deserialize)]
struct TranscriptionAlternative {
    transcript: String,
}

impl HttpTranscriber {
    pub fn new(config: TranscriptionConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to build HTTP client");

        Self { client, config }
    }
}

fn extract_transcript(response: TranscriptionResponse) -> Result<String, DomainError> {
    response
        .results
        .channels
        .first()
        .and_then(|c| c.alternatives.first())
        .map(|a| a.transcript.trim().to_string())
        .ok_or_else(|| {
            DomainError::TranscriptionUnavailable("response contained no transcript".to_string())
        })
}

#[async_trait]
impl Transcriber for HttpTranscriber {
    async fn transcribe(&self, recording_url: &str) -> Result<String, DomainError> {
        tracing::debug!(recording_url, "requesting transcription");

        let response = self
            .client
            .post(&self.config.api_url)
            .header("Authorization", format!("Token {}", self.config.api_key))
            .json(&json!({ "url": recording_url }))
            .send()
            .await
            .map_err(|e| DomainError::TranscriptionUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::TranscriptionUnavailable(format!(
                "transcription API returned {status}: {body}"
            )));
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| DomainError::TranscriptionUnavailable(e.to_string()))?;

        extract_transcript(parsed)
    }
}
