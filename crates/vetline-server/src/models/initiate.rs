//! Initiate DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request to start one phone assessment
#[derive(Debug, Deserialize, ToSchema)]
pub struct InitiateAssessmentRequest {
    /// Candidate phone number, E.164 or common human formatting
    pub candidate_phone: String,
    /// Role key from the question bank (e.g. "bartender")
    pub role: String,
    /// Caller-side candidate identifier (optional)
    pub candidate_id: Option<String>,
}

/// Response after the outbound call was placed
#[derive(Debug, Serialize, ToSchema)]
pub struct InitiateAssessmentResponse {
    pub assessment_id: String,
    pub provider_call_id: String,
    pub candidate_phone: String,
    pub role: String,
    pub status: String,
}
