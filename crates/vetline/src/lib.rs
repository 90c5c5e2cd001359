//! Vetline Domain Library
//!
//! Core domain types and interfaces for the Vetline voice skills-assessment
//! platform.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain/`): Pure business entities and logic
//!   - `entities/`: Core domain models (Role, CallSession, AssessmentResult)
//!   - `value_objects/`: Immutable value types (Tier, Recommendation, PhoneNumber)
//!   - `services/`: Pure domain logic (rubric aggregation, recommendation)
//!   - `errors`: Domain-specific error types
//!
//! - **Ports** (`ports/`): Abstract interfaces (traits)
//!   - `repositories/`: Data access interfaces (sessions, results)
//!   - `services/`: External capability interfaces (telephony, transcription,
//!     evaluation)
//!
//! # Usage
//!
//! ```rust,ignore
//! use vetline::domain::{CallSession, QuestionBank, Role};
//! use vetline::ports::{SessionRepository, Evaluator};
//! ```

pub mod domain;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    assessment_id, AssessmentResult, CallEvent, CallSession, Category, CategoryResult,
    DomainError, IndexEntry, Instruction, PhoneNumber, PromptRef, Question, QuestionBank,
    Recommendation, RecommendationPolicy, ResponseRecord, ResponseWindow, Role, Rubric,
    RubricTier, ScoredAnswer, SessionStatus, Tier,
};
pub use ports::{
    EvaluationRequest, EvaluationVerdict, Evaluator, ResultRepository, SessionRepository,
    TelephonyGateway, Transcriber,
};
