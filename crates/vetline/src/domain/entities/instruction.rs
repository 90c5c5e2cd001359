//! Instruction - Next action for the telephony gateway
//!
//! The output alphabet of the call-flow state machine. Provider-neutral:
//! the gateway adapter renders these into the provider's call-control
//! markup.

use serde::{Deserialize, Serialize};

/// Everything the gateway needs to play one question prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRef {
    pub role_key: String,
    pub question_key: String,
    pub prompt_text: String,
    pub audio_url: Option<String>,
}

/// Which response-collection window to open after a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseWindow {
    /// The short window used directly after a question.
    Standard,
    /// The long window opened after the instructions replay.
    Extended,
}

/// The single next instruction returned for one webhook event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    /// Play a question prompt (optionally preceded by the role intro) and
    /// open a response window.
    Ask {
        prompt: PromptRef,
        include_intro: bool,
        intro_audio: Option<String>,
        window: ResponseWindow,
    },

    /// Replay the current question after a repeat request.
    Replay {
        prompt: PromptRef,
        window: ResponseWindow,
    },

    /// Play the "press pound when finished" instructions and reopen an
    /// extended window for the same question, without advancing.
    Encourage { prompt: PromptRef },

    /// Open a recording window for the current question without replaying
    /// its prompt.
    Listen {
        prompt: PromptRef,
        window: ResponseWindow,
    },

    /// Play the role goodbye and hang up.
    Conclude { goodbye_audio: Option<String> },

    /// Apologize briefly and hang up. The call never waits on a silent
    /// line after an internal failure.
    Apologize { message: String },

    /// Plain acknowledgement with no call-control content (status
    /// callbacks).
    Acknowledge,
}

impl Instruction {
    pub fn apologize() -> Self {
        Self::Apologize {
            message: "We're sorry, something went wrong with this assessment. \
                      We will contact you to reschedule. Goodbye."
                .to_string(),
        }
    }
}
