//! Telephony Webhook Payloads
//!
//! The provider posts form-encoded callbacks with PascalCase field names;
//! routing context (assessment id, question key) travels in the query
//! string, exactly as the callback URLs were issued. These parsers turn
//! one raw callback into one domain `CallEvent`.

use serde::Deserialize;

use vetline::domain::{CallEvent, DomainError};

/// Query parameters carried by every webhook callback URL.
#[derive(Debug, Deserialize)]
pub struct WebhookQuery {
    pub assessment_id: String,
    /// Question key, present on recording/gather callbacks.
    pub question: Option<String>,
}

/// Form body of a recording-complete callback.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecordingCallback {
    pub call_sid: Option<String>,
    pub digits: Option<String>,
    pub recording_url: Option<String>,
    pub recording_duration: Option<String>,
}

/// Form body of a keypad-gather callback.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GatherCallback {
    pub call_sid: Option<String>,
    pub digits: Option<String>,
}

/// Form body of a call-status callback.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatusCallback {
    pub call_sid: Option<String>,
    pub call_status: Option<String>,
}

fn parse_form<T: Default + for<'de> Deserialize<'de>>(body: &str) -> Result<T, DomainError> {
    if body.trim().is_empty() {
        return Ok(T::default());
    }
    serde_urlencoded::from_str(body)
        .map_err(|e| DomainError::malformed(format!("invalid webhook form body: {e}")))
}

/// Parse the call-answered callback.
pub fn answered_event(query: &WebhookQuery) -> CallEvent {
    CallEvent::Answered {
        assessment_id: query.assessment_id.clone(),
    }
}

/// Parse a recording-complete callback body.
pub fn recording_event(query: &WebhookQuery, body: &str) -> Result<CallEvent, DomainError> {
    let question_key = query
        .question
        .clone()
        .ok_or_else(|| DomainError::malformed("recording callback without question key"))?;
    let form: RecordingCallback = parse_form(body)?;

    let duration_secs = form
        .recording_duration
        .as_deref()
        .and_then(|d| d.parse::<u32>().ok())
        .unwrap_or(0);

    Ok(CallEvent::RecordingComplete {
        assessment_id: query.assessment_id.clone(),
        question_key,
        recording_url: form.recording_url.filter(|u| !u.is_empty()),
        duration_secs,
        digits: form.digits.filter(|d| !d.is_empty()),
    })
}

/// Parse a keypad-gather callback body.
pub fn gather_event(query: &WebhookQuery, body: &str) -> Result<CallEvent, DomainError> {
    let question_key = query
        .question
        .clone()
        .ok_or_else(|| DomainError::malformed("gather callback without question key"))?;
    let form: GatherCallback = parse_form(body)?;

    Ok(CallEvent::GatherComplete {
        assessment_id: query.assessment_id.clone(),
        question_key,
        digits: form.digits.filter(|d| !d.is_empty()),
    })
}

/// Parse a call-status callback body.
pub fn status_event(query: &WebhookQuery, body: &str) -> Result<CallEvent, DomainError> {
    let form: StatusCallback = parse_form(body)?;
    let call_status = form
        .call_status
        .ok_or_else(|| DomainError::malformed("status callback without CallStatus"))?;

    Ok(CallEvent::StatusUpdate {
        assessment_id: query.assessment_id.clone(),
        call_status,
    })
}
