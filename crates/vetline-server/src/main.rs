use std::sync::Arc;

use anyhow::Context;
use axum::{routing::get, Json, Router};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod adapters;
mod application;
mod config;
mod models;
mod routes;

use adapters::{
    HttpTranscriber, LlmEvaluator, MarkupRenderer, PgResultRepository, PgSessionRepository,
    RestTelephonyGateway,
};
use application::{FlowService, ScoringService};
use config::ServerConfig;
use vetline::domain::QuestionBank;

/// Type aliases for application services with concrete repository implementations
pub type AppFlowService = FlowService<PgSessionRepository>;
pub type AppScoringService = ScoringService<PgSessionRepository, PgResultRepository>;

/// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<PgSessionRepository>,
    pub results: Arc<PgResultRepository>,
    pub bank: Arc<QuestionBank>,
    pub flow: Arc<AppFlowService>,
    pub scoring: Arc<AppScoringService>,
    pub telephony: Arc<RestTelephonyGateway>,
    pub renderer: Arc<MarkupRenderer>,
    pub public_base_url: String,
}

#[derive(Serialize)]
struct HealthCheck {
    status: String,
    message: String,
    version: String,
}

async fn health_check() -> Json<HealthCheck> {
    Json(HealthCheck {
        status: "ok".to_string(),
        message: "Vetline API is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn load_question_bank(config: &ServerConfig) -> anyhow::Result<QuestionBank> {
    match &config.roles_path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read question bank from {path}"))?;
            Ok(QuestionBank::from_json(&json)?)
        }
        None => Ok(QuestionBank::builtin()?),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Vetline API initializing");

    let config = ServerConfig::from_env()?;

    // Fail fast on a malformed question bank, before the server binds.
    let bank = Arc::new(load_question_bank(&config)?);
    tracing::info!(roles = ?bank.role_keys(), "question bank loaded");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .context("failed to run database migrations")?;
    tracing::info!("database migrations completed");

    // Repositories and adapters
    let sessions = Arc::new(PgSessionRepository::new(pool.clone()));
    let results = Arc::new(PgResultRepository::new(pool));
    let telephony = Arc::new(RestTelephonyGateway::new(config.telephony.clone()));
    let transcriber = Arc::new(HttpTranscriber::new(config.transcription.clone()));
    let evaluator = Arc::new(LlmEvaluator::new(config.evaluator.clone()));
    let renderer = Arc::new(MarkupRenderer::new(
        config.public_base_url.clone(),
        config.flow.clone(),
        config.instructions_audio.clone(),
    ));

    // Application services
    let flow = Arc::new(FlowService::new(
        sessions.clone(),
        bank.clone(),
        config.flow.clone(),
    ));
    let scoring = Arc::new(ScoringService::new(
        sessions.clone(),
        results.clone(),
        bank.clone(),
        transcriber,
        evaluator,
    ));

    let state = AppState {
        sessions,
        results,
        bank,
        flow,
        scoring,
        telephony,
        renderer,
        public_base_url: config.public_base_url.clone(),
    };

    // OpenAPI documentation
    let openapi = routes::swagger::ApiDoc::openapi();

    let router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .route("/health", get(health_check))
        .merge(routes::initiate::router())
        .merge(routes::telephony::router())
        .merge(routes::assessments::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "Vetline API ready");

    axum::serve(listener, router)
        .await
        .context("server terminated")?;

    Ok(())
}
