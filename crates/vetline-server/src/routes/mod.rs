//! Vetline API Routes
//!
//! - /initiate - start one phone assessment
//! - /webhook/* - telephony provider callbacks (answered, recording,
//!   gather, status), answered synchronously with call-control markup
//! - /assessments - dashboard index and result reads, rescore
//! - /swagger-ui - OpenAPI documentation

pub mod assessments;
pub mod initiate;
pub mod swagger;
pub mod telephony;

use axum::http::StatusCode;

use vetline::domain::DomainError;

/// Map a domain error to an HTTP status for JSON endpoints.
pub fn error_status(error: &DomainError) -> StatusCode {
    match error {
        DomainError::InvalidRequest(_) | DomainError::MalformedEvent(_) => StatusCode::BAD_REQUEST,
        DomainError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::ExternalService(_)
        | DomainError::TranscriptionUnavailable(_)
        | DomainError::EvaluationUnavailable(_) => StatusCode::BAD_GATEWAY,
        DomainError::Persistence(_) | DomainError::Validation(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Standard error tuple for JSON endpoints.
pub fn json_error(error: DomainError) -> (StatusCode, String) {
    (error_status(&error), error.to_string())
}
