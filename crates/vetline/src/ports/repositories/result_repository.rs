//! Result Repository Port
//!
//! Abstract interface for the result publisher: durable assessment results
//! plus the global discovery index.

use async_trait::async_trait;

use crate::domain::{AssessmentResult, DomainError, IndexEntry};

/// Repository interface for assessment results and the global index
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// Store one assessment result and upsert its index entry. Idempotent:
    /// republishing the same assessment id overwrites rather than
    /// duplicates, and concurrent publishes never lose an index entry.
    async fn publish(&self, result: &AssessmentResult) -> Result<(), DomainError>;

    /// Record a failed scoring run in the index so the assessment is
    /// discoverable rather than silently missing.
    async fn publish_failed(&self, entry: &IndexEntry) -> Result<(), DomainError>;

    /// Fetch one full assessment result.
    async fn find(&self, assessment_id: &str)
        -> Result<Option<AssessmentResult>, DomainError>;

    /// List all index entries, newest first.
    async fn index(&self) -> Result<Vec<IndexEntry>, DomainError>;
}
