//! OpenAPI Documentation
//!
//! Centralized API documentation using utoipa. Telephony webhook routes
//! speak provider markup rather than JSON and are intentionally left out.

use utoipa::OpenApi;

use crate::models::{
    AssessmentIndexResponse, AssessmentResultResponse, AssessmentSummary, CategoryResultDto,
    InitiateAssessmentRequest, InitiateAssessmentResponse, ScoredAnswerDto,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::initiate::initiate_assessment,
        super::assessments::list_assessments,
        super::assessments::get_assessment,
        super::assessments::rescore_assessment,
    ),
    info(
        title = "Vetline API",
        version = "0.1.0",
        description = "Voice skills assessments: outbound phone screens with rubric-based LLM scoring.",
        license(name = "MIT"),
    ),
    servers(
        (url = "/", description = "Current server"),
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Assessment", description = "Assessment initiation, results and index"),
    ),
    components(
        schemas(
            InitiateAssessmentRequest,
            InitiateAssessmentResponse,
            AssessmentSummary,
            AssessmentIndexResponse,
            AssessmentResultResponse,
            ScoredAnswerDto,
            CategoryResultDto,
        )
    )
)]
pub struct ApiDoc;
