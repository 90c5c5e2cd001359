//! PostgreSQL implementation of ResultRepository
//!
//! Results and index entries are upserted in one transaction. The index is
//! one row per assessment, merged at read time, so concurrent publishes of
//! different assessments never race each other.

use async_trait::async_trait;
use sqlx::PgPool;

use vetline::domain::{AssessmentResult, DomainError, IndexEntry};
use vetline::ports::ResultRepository;

/// PostgreSQL implementation of ResultRepository
pub struct PgResultRepository {
    pool: PgPool,
}

impl PgResultRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct IndexRow {
    assessment_id: String,
    role: String,
    status: String,
    analyzed_at: chrono::DateTime<chrono::Utc>,
}

impl From<IndexRow> for IndexEntry {
    fn from(row: IndexRow) -> Self {
        Self {
            assessment_id: row.assessment_id,
            role: row.role,
            status: row.status,
            analyzed_at: row.analyzed_at,
        }
    }
}

#[async_trait]
impl ResultRepository for PgResultRepository {
    async fn publish(&self, result: &AssessmentResult) -> Result<(), DomainError> {
        let document = serde_json::to_value(result)
            .map_err(|e| DomainError::Persistence(e.to_string()))?;
        let entry = IndexEntry::scored(result);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::Persistence(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO assessment_results (assessment_id, role, result, analyzed_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (assessment_id)
            DO UPDATE SET role = $2, result = $3, analyzed_at = $4
            "#,
        )
        .bind(&result.assessment_id)
        .bind(&result.role)
        .bind(&document)
        .bind(result.analyzed_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| DomainError::Persistence(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO assessment_index (assessment_id, role, status, analyzed_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (assessment_id)
            DO UPDATE SET role = $2, status = $3, analyzed_at = $4
            "#,
        )
        .bind(&entry.assessment_id)
        .bind(&entry.role)
        .bind(&entry.status)
        .bind(entry.analyzed_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| DomainError::Persistence(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| DomainError::Persistence(e.to_string()))
    }

    async fn publish_failed(&self, entry: &IndexEntry) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO assessment_index (assessment_id, role, status, analyzed_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (assessment_id)
            DO UPDATE SET role = $2, status = $3, analyzed_at = $4
            "#,
        )
        .bind(&entry.assessment_id)
        .bind(&entry.role)
        .bind(&entry.status)
        .bind(entry.analyzed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::Persistence(e.to_string()))?;

        Ok(())
    }

    async fn find(
        &self,
        assessment_id: &str,
    ) -> Result<Option<AssessmentResult>, DomainError> {
        let document: Option<serde_json::Value> = sqlx::query_scalar(
            "SELECT result FROM assessment_results WHERE assessment_id = $1",
        )
        .bind(assessment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::Persistence(e.to_string()))?;

        document
            .map(|doc| {
                serde_json::from_value(doc)
                    .map_err(|e| DomainError::Persistence(format!("corrupt result document: {e}")))
            })
            .transpose()
    }

    async fn index(&self) -> Result<Vec<IndexEntry>, DomainError> {
        let rows = sqlx::query_as::<_, IndexRow>(
            "SELECT * FROM assessment_index ORDER BY analyzed_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::Persistence(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
