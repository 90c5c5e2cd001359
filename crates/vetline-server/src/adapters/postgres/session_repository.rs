//! PostgreSQL implementation of SessionRepository
//!
//! Session writes are conditional on the stored version so that a webhook
//! invocation racing a duplicate delivery cannot apply a transition against
//! stale state.

use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::PgPool;

use vetline::domain::{CallSession, DomainError, ResponseRecord, SessionStatus};
use vetline::ports::SessionRepository;

/// PostgreSQL implementation of SessionRepository
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Internal row type for sqlx mapping
#[derive(sqlx::FromRow)]
struct CallSessionRow {
    id: String,
    provider_call_id: Option<String>,
    role: String,
    candidate_phone: String,
    candidate_id: Option<String>,
    current_question_index: i64,
    responses: serde_json::Value,
    repeats: serde_json::Value,
    timeouts: serde_json::Value,
    status: String,
    version: i64,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<CallSessionRow> for CallSession {
    fn from(row: CallSessionRow) -> Self {
        let responses: BTreeMap<String, ResponseRecord> =
            serde_json::from_value(row.responses).unwrap_or_default();
        let repeats: BTreeMap<String, u32> =
            serde_json::from_value(row.repeats).unwrap_or_default();
        let timeouts: BTreeMap<String, u32> =
            serde_json::from_value(row.timeouts).unwrap_or_default();

        let status = match row.status.as_str() {
            "completed" => SessionStatus::Completed,
            "failed" => SessionStatus::Failed,
            "abandoned" => SessionStatus::Abandoned,
            _ => SessionStatus::InProgress,
        };

        Self {
            id: row.id,
            provider_call_id: row.provider_call_id,
            role: row.role,
            candidate_phone: row.candidate_phone,
            candidate_id: row.candidate_id,
            current_question_index: row.current_question_index.max(0) as usize,
            responses,
            repeats,
            timeouts,
            status,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn status_to_string(status: SessionStatus) -> &'static str {
    match status {
        SessionStatus::InProgress => "in_progress",
        SessionStatus::Completed => "completed",
        SessionStatus::Failed => "failed",
        SessionStatus::Abandoned => "abandoned",
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, DomainError> {
    serde_json::to_value(value).map_err(|e| DomainError::Persistence(e.to_string()))
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn create(&self, session: &CallSession) -> Result<CallSession, DomainError> {
        let row = sqlx::query_as::<_, CallSessionRow>(
            r#"
            INSERT INTO call_sessions
                (id, provider_call_id, role, candidate_phone, candidate_id,
                 current_question_index, responses, repeats, timeouts, status,
                 version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 0, $11, $11)
            RETURNING *
            "#,
        )
        .bind(&session.id)
        .bind(&session.provider_call_id)
        .bind(&session.role)
        .bind(&session.candidate_phone)
        .bind(&session.candidate_id)
        .bind(session.current_question_index as i64)
        .bind(to_json(&session.responses)?)
        .bind(to_json(&session.repeats)?)
        .bind(to_json(&session.timeouts)?)
        .bind(status_to_string(session.status))
        .bind(session.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::Persistence(e.to_string()))?;

        Ok(row.into())
    }

    async fn find(&self, id: &str) -> Result<Option<CallSession>, DomainError> {
        let row = sqlx::query_as::<_, CallSessionRow>("SELECT * FROM call_sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::Persistence(e.to_string()))?;

        Ok(row.map(Into::into))
    }

    async fn find_by_call_id(
        &self,
        call_id: &str,
    ) -> Result<Option<CallSession>, DomainError> {
        let row = sqlx::query_as::<_, CallSessionRow>(
            "SELECT * FROM call_sessions WHERE provider_call_id = $1",
        )
        .bind(call_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::Persistence(e.to_string()))?;

        Ok(row.map(Into::into))
    }

    async fn update(&self, session: &CallSession) -> Result<CallSession, DomainError> {
        let row = sqlx::query_as::<_, CallSessionRow>(
            r#"
            UPDATE call_sessions
            SET provider_call_id = $2,
                current_question_index = $3,
                responses = $4,
                repeats = $5,
                timeouts = $6,
                status = $7,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND version = $8
            RETURNING *
            "#,
        )
        .bind(&session.id)
        .bind(&session.provider_call_id)
        .bind(session.current_question_index as i64)
        .bind(to_json(&session.responses)?)
        .bind(to_json(&session.repeats)?)
        .bind(to_json(&session.timeouts)?)
        .bind(status_to_string(session.status))
        .bind(session.version)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::Persistence(e.to_string()))?;

        row.map(Into::into)
            .ok_or_else(|| DomainError::Conflict(session.id.clone()))
    }
}
