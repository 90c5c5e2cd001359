//! Assessment Routes - Dashboard reads and rescoring

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

use vetline::ports::ResultRepository;

use crate::models::{AssessmentIndexResponse, AssessmentResultResponse};
use crate::routes::json_error;
use crate::AppState;

/// List the global assessment index, newest first.
#[utoipa::path(
    get,
    path = "/assessments",
    responses(
        (status = 200, description = "Assessment index", body = AssessmentIndexResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Assessment"
)]
pub async fn list_assessments(
    State(state): State<AppState>,
) -> Result<Json<AssessmentIndexResponse>, (axum::http::StatusCode, String)> {
    let entries = state.results.index().await.map_err(json_error)?;
    Ok(Json(AssessmentIndexResponse::from_domain(entries)))
}

/// Fetch one full assessment result.
#[utoipa::path(
    get,
    path = "/assessments/{assessment_id}",
    params(
        ("assessment_id" = String, Path, description = "Assessment ID")
    ),
    responses(
        (status = 200, description = "Assessment result", body = AssessmentResultResponse),
        (status = 404, description = "Assessment not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Assessment"
)]
pub async fn get_assessment(
    State(state): State<AppState>,
    Path(assessment_id): Path<String>,
) -> Result<Json<AssessmentResultResponse>, (axum::http::StatusCode, String)> {
    let result = state
        .results
        .find(&assessment_id)
        .await
        .map_err(json_error)?
        .ok_or((
            axum::http::StatusCode::NOT_FOUND,
            "Assessment not found".to_string(),
        ))?;

    Ok(Json(AssessmentResultResponse::from_domain(result)))
}

/// Re-run scoring for a completed session. Overwrites the published
/// result; useful after evaluator outages.
#[utoipa::path(
    post,
    path = "/assessments/{assessment_id}/rescore",
    params(
        ("assessment_id" = String, Path, description = "Assessment ID")
    ),
    responses(
        (status = 200, description = "Assessment rescored", body = AssessmentResultResponse),
        (status = 400, description = "Session is not in a scorable state"),
        (status = 404, description = "Session not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Assessment"
)]
pub async fn rescore_assessment(
    State(state): State<AppState>,
    Path(assessment_id): Path<String>,
) -> Result<Json<AssessmentResultResponse>, (axum::http::StatusCode, String)> {
    let result = state
        .scoring
        .score_assessment(&assessment_id)
        .await
        .map_err(json_error)?;

    Ok(Json(AssessmentResultResponse::from_domain(result)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/assessments", get(list_assessments))
        .route("/assessments/:assessment_id", get(get_assessment))
        .route(
            "/assessments/:assessment_id/rescore",
            post(rescore_assessment),
        )
}
