//! Telephony Webhook Routes
//!
//! Provider callbacks for the live call. Each handler verifies the webhook
//! signature over the raw body, parses the payload into a domain event,
//! runs one state-machine transition, and replies synchronously with
//! call-control markup.
//!
//! Failure policy for a live call: a malformed payload or missing session
//! gets an apology-and-hangup document (the candidate is never left on a
//! silent line), while a storage failure returns 500 so the provider's own
//! retry policy redelivers the event - the transitions are idempotent
//! under redelivery.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};

use vetline::domain::{CallEvent, DomainError, Instruction};

use crate::adapters::telephony::SIGNATURE_HEADER;
use crate::models::{answered_event, gather_event, recording_event, status_event, WebhookQuery};
use crate::AppState;

fn markup_response(markup: String) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/xml")],
        markup,
    )
        .into_response()
}

fn verify(state: &AppState, headers: &HeaderMap, body: &str) -> Result<(), Response> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    state
        .telephony
        .verify_signature(body.as_bytes(), signature)
        .map_err(|e| {
            tracing::warn!(error = %e, "rejected webhook with bad signature");
            (StatusCode::FORBIDDEN, "invalid signature".to_string()).into_response()
        })
}

/// Run one event through the state machine and render the reply.
async fn dispatch(state: &AppState, query: &WebhookQuery, event: CallEvent) -> Response {
    match state.flow.handle_event(event).await {
        Ok(outcome) => {
            // Scoring runs out-of-band; the candidate hears the goodbye
            // while analysis starts.
            if let Some(assessment_id) = outcome.completed {
                let scoring = state.scoring.clone();
                tokio::spawn(async move {
                    if let Err(e) = scoring.score_assessment(&assessment_id).await {
                        tracing::error!(%assessment_id, error = %e, "post-call scoring failed");
                    }
                });
            }
            markup_response(state.renderer.render(&outcome.instruction, &query.assessment_id))
        }
        Err(DomainError::Persistence(detail)) => {
            tracing::error!(assessment_id = %query.assessment_id, %detail, "session store failure");
            (StatusCode::INTERNAL_SERVER_ERROR, "persistence error".to_string()).into_response()
        }
        Err(e) => {
            tracing::warn!(assessment_id = %query.assessment_id, error = %e, "ending call after webhook error");
            markup_response(
                state
                    .renderer
                    .render(&Instruction::apologize(), &query.assessment_id),
            )
        }
    }
}

/// Call answered: ask the first (or current) question.
pub async fn answered(
    State(state): State<AppState>,
    Query(query): Query<WebhookQuery>,
    headers: HeaderMap,
    body: String,
) -> Response {
    if let Err(response) = verify(&state, &headers, &body) {
        return response;
    }
    let event = answered_event(&query);
    dispatch(&state, &query, event).await
}

/// A response window closed.
pub async fn recording(
    State(state): State<AppState>,
    Query(query): Query<WebhookQuery>,
    headers: HeaderMap,
    body: String,
) -> Response {
    if let Err(response) = verify(&state, &headers, &body) {
        return response;
    }
    match recording_event(&query, &body) {
        Ok(event) => dispatch(&state, &query, event).await,
        Err(e) => {
            tracing::warn!(assessment_id = %query.assessment_id, error = %e, "malformed recording callback");
            markup_response(
                state
                    .renderer
                    .render(&Instruction::apologize(), &query.assessment_id),
            )
        }
    }
}

/// Keypad-only collection finished.
pub async fn gather(
    State(state): State<AppState>,
    Query(query): Query<WebhookQuery>,
    headers: HeaderMap,
    body: String,
) -> Response {
    if let Err(response) = verify(&state, &headers, &body) {
        return response;
    }
    match gather_event(&query, &body) {
        Ok(event) => dispatch(&state, &query, event).await,
        Err(e) => {
            tracing::warn!(assessment_id = %query.assessment_id, error = %e, "malformed gather callback");
            markup_response(
                state
                    .renderer
                    .render(&Instruction::apologize(), &query.assessment_id),
            )
        }
    }
}

/// Provider call-status callback (hangup, failure). Replies 200 with an
/// empty document; there is no candidate on the line to instruct.
pub async fn status(
    State(state): State<AppState>,
    Query(query): Query<WebhookQuery>,
    headers: HeaderMap,
    body: String,
) -> Response {
    if let Err(response) = verify(&state, &headers, &body) {
        return response;
    }
    match status_event(&query, &body) {
        Ok(event) => dispatch(&state, &query, event).await,
        Err(e) => {
            tracing::warn!(assessment_id = %query.assessment_id, error = %e, "malformed status callback");
            (StatusCode::OK, "OK".to_string()).into_response()
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/webhook/answered", post(answered))
        .route("/webhook/recording", post(recording))
        .route("/webhook/gather", post(gather))
        .route("/webhook/status", post(status))
}
