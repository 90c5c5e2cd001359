//! Server Configuration
//!
//! All deployment-specific values come from the environment (a `.env` file
//! is honored in development). Call-flow timing and the repeat cap live
//! here so the state machine itself stays free of magic numbers.

use anyhow::{Context, Result};

/// Telephony provider settings
#[derive(Debug, Clone)]
pub struct TelephonyConfig {
    /// Provider REST API base, e.g. "https://api.telephony.example/v1".
    pub api_url: String,
    pub account_id: String,
    pub auth_token: String,
    /// Caller id for outbound assessment calls.
    pub from_number: String,
    /// Shared secret for verifying inbound webhook signatures. When unset,
    /// signature verification is skipped (development only).
    pub webhook_secret: Option<String>,
}

/// Speech-to-text provider settings
#[derive(Debug, Clone)]
pub struct TranscriptionConfig {
    pub api_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

/// LLM evaluator settings
#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    /// Pinned low for consistent grading.
    pub temperature: f32,
    pub timeout_secs: u64,
}

/// Call-flow policy knobs
#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// Maximum "repeat the question" requests per question.
    pub repeat_cap: u32,
    /// Short silence window directly after a question, in seconds.
    pub response_timeout_secs: u32,
    /// Long window opened after the instructions replay, in seconds.
    pub extended_timeout_secs: u32,
    /// Hard cap on a single answer recording, in seconds.
    pub max_answer_secs: u32,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            repeat_cap: 3,
            response_timeout_secs: 5,
            extended_timeout_secs: 120,
            max_answer_secs: 120,
        }
    }
}

/// Full server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub database_url: String,
    /// Public base URL the telephony provider can reach for webhooks.
    pub public_base_url: String,
    /// Optional question-bank override; the built-in bank is used otherwise.
    pub roles_path: Option<String>,
    /// Pre-recorded "press pound when finished" instructions prompt.
    pub instructions_audio: Option<String>,
    pub telephony: TelephonyConfig,
    pub transcription: TranscriptionConfig,
    pub evaluator: EvaluatorConfig,
    pub flow: FlowConfig,
}

fn env_var(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("missing required env var {name}"))
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("invalid value for env var {name}")),
        Err(_) => Ok(default),
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let flow_defaults = FlowConfig::default();

        Ok(Self {
            bind_addr: env_or("BIND_ADDR", "0.0.0.0:8080"),
            database_url: env_var("DATABASE_URL")?,
            public_base_url: env_var("PUBLIC_BASE_URL")?
                .trim_end_matches('/')
                .to_string(),
            roles_path: std::env::var("ROLES_PATH").ok(),
            instructions_audio: std::env::var("INSTRUCTIONS_AUDIO_URL").ok(),
            telephony: TelephonyConfig {
                api_url: env_var("TELEPHONY_API_URL")?
                    .trim_end_matches('/')
                    .to_string(),
                account_id: env_var("TELEPHONY_ACCOUNT_ID")?,
                auth_token: env_var("TELEPHONY_AUTH_TOKEN")?,
                from_number: env_var("TELEPHONY_FROM_NUMBER")?,
                webhook_secret: std::env::var("TELEPHONY_WEBHOOK_SECRET").ok(),
            },
            transcription: TranscriptionConfig {
                api_url: env_var("TRANSCRIBE_API_URL")?,
                api_key: env_var("TRANSCRIBE_API_KEY")?,
                timeout_secs: env_parse("TRANSCRIBE_TIMEOUT_SECS", 60)?,
            },
            evaluator: EvaluatorConfig {
                api_url: env_var("EVALUATOR_API_URL")?,
                api_key: env_var("EVALUATOR_API_KEY")?,
                model: env_or("EVALUATOR_MODEL", "claude-sonnet-4-20250514"),
                max_tokens: env_parse("EVALUATOR_MAX_TOKENS", 4000)?,
                temperature: env_parse("EVALUATOR_TEMPERATURE", 0.1)?,
                timeout_secs: env_parse("EVALUATOR_TIMEOUT_SECS", 90)?,
            },
            flow: FlowConfig {
                repeat_cap: env_parse("FLOW_REPEAT_CAP", flow_defaults.repeat_cap)?,
                response_timeout_secs: env_parse(
                    "FLOW_RESPONSE_TIMEOUT_SECS",
                    flow_defaults.response_timeout_secs,
                )?,
                extended_timeout_secs: env_parse(
                    "FLOW_EXTENDED_TIMEOUT_SECS",
                    flow_defaults.extended_timeout_secs,
                )?,
                max_answer_secs: env_parse("FLOW_MAX_ANSWER_SECS", flow_defaults.max_answer_secs)?,
            },
        })
    }
}
