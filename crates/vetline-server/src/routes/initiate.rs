//! Initiate Route - Start an outbound assessment call

use axum::{extract::State, routing::post, Json, Router};
use chrono::Utc;

use vetline::domain::{assessment_id, CallSession, DomainError, PhoneNumber};
use vetline::ports::{SessionRepository, TelephonyGateway};

use crate::models::{InitiateAssessmentRequest, InitiateAssessmentResponse};
use crate::routes::json_error;
use crate::AppState;

/// Start one phone assessment: validate the request, create the session,
/// place the outbound call.
#[utoipa::path(
    post,
    path = "/initiate",
    request_body = InitiateAssessmentRequest,
    responses(
        (status = 200, description = "Call placed", body = InitiateAssessmentResponse),
        (status = 400, description = "Invalid phone number or unknown role"),
        (status = 502, description = "Telephony provider rejected the call"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Assessment"
)]
pub async fn initiate_assessment(
    State(state): State<AppState>,
    Json(payload): Json<InitiateAssessmentRequest>,
) -> Result<Json<InitiateAssessmentResponse>, (axum::http::StatusCode, String)> {
    let phone = PhoneNumber::parse(&payload.candidate_phone).map_err(json_error)?;

    let role = state.bank.role(&payload.role).ok_or_else(|| {
        json_error(DomainError::InvalidRequest(format!(
            "unknown role {}. Available: {}",
            payload.role,
            state.bank.role_keys().join(", ")
        )))
    })?;

    let id = assessment_id(&role.key, &phone, Utc::now());
    let session = CallSession::new(
        id.clone(),
        role.key.clone(),
        phone.clone(),
        payload.candidate_id.clone(),
    );
    let session = state.sessions.create(&session).await.map_err(json_error)?;

    let call_id = state
        .telephony
        .place_call(&phone, &state.public_base_url, &id)
        .await
        .map_err(json_error)?;

    // Remember the provider's call id for status-callback correlation.
    let mut session = session;
    session.provider_call_id = Some(call_id.clone());
    if let Err(e) = state.sessions.update(&session).await {
        tracing::warn!(assessment_id = %id, error = %e, "failed to record provider call id");
    }

    tracing::info!(assessment_id = %id, call_id = %call_id, "assessment initiated");

    Ok(Json(InitiateAssessmentResponse {
        assessment_id: id,
        provider_call_id: call_id,
        candidate_phone: phone.to_string(),
        role: role.key.clone(),
        status: "initiated".to_string(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/initiate", post(initiate_assessment))
}
