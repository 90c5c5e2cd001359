//! CallEvent - Inbound webhook events
//!
//! The input alphabet of the call-flow state machine. The server's
//! telephony models parse provider webhook payloads into these values; the
//! state machine never sees provider wire formats.

use serde::{Deserialize, Serialize};

/// One parsed telephony webhook event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CallEvent {
    /// The outbound call was answered.
    Answered { assessment_id: String },

    /// A response-collection window for a question closed: the candidate
    /// pressed a key, the window elapsed, or the provider finished a
    /// recording.
    RecordingComplete {
        assessment_id: String,
        question_key: String,
        recording_url: Option<String>,
        duration_secs: u32,
        /// Keypad digits pressed during collection, if any.
        digits: Option<String>,
    },

    /// A keypad-only collection finished (used for repeat prompts).
    GatherComplete {
        assessment_id: String,
        question_key: String,
        digits: Option<String>,
    },

    /// Provider call-status callback (completed, failed, busy, no-answer).
    StatusUpdate {
        assessment_id: String,
        call_status: String,
    },
}

impl CallEvent {
    pub fn assessment_id(&self) -> &str {
        match self {
            Self::Answered { assessment_id }
            | Self::RecordingComplete { assessment_id, .. }
            | Self::GatherComplete { assessment_id, .. }
            | Self::StatusUpdate { assessment_id, .. } => assessment_id,
        }
    }
}

/// The submit key ends a response window early.
pub const SUBMIT_KEY: &str = "#";
/// The repeat key replays the current question.
pub const REPEAT_KEY: &str = "*";
