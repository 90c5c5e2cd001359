//! Session Repository Port
//!
//! Abstract interface for call-session persistence. The session store is
//! the only shared mutable resource in the system; correctness of the
//! webhook flow depends entirely on this round-trip.

use async_trait::async_trait;

use crate::domain::{CallSession, DomainError};

/// Repository interface for call sessions
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Insert a freshly created session.
    async fn create(&self, session: &CallSession) -> Result<CallSession, DomainError>;

    /// Find a session by assessment id.
    async fn find(&self, id: &str) -> Result<Option<CallSession>, DomainError>;

    /// Find a session by the provider's call identifier.
    async fn find_by_call_id(&self, call_id: &str)
        -> Result<Option<CallSession>, DomainError>;

    /// Persist an updated session with a conditional write: the update only
    /// applies if the stored version still matches `session.version`, and
    /// fails with [`DomainError::Conflict`] otherwise. Returns the session
    /// with its new version.
    async fn update(&self, session: &CallSession) -> Result<CallSession, DomainError>;
}
