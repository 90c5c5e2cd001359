//! Infrastructure Adapters
//!
//! Implementations of domain ports for external systems: Postgres
//! persistence, the telephony provider REST API, call-control markup
//! rendering, speech-to-text, and the LLM evaluator.

pub mod evaluator;
pub mod markup;
pub mod postgres;
pub mod telephony;
pub mod transcribe;

// Re-exports
pub use evaluator::LlmEvaluator;
pub use markup::MarkupRenderer;
pub use postgres::{PgResultRepository, PgSessionRepository};
pub use telephony::RestTelephonyGateway;
pub use transcribe::HttpTranscriber;
