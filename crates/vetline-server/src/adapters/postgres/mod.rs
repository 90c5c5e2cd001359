//! PostgreSQL Adapters
//!
//! Repository implementations against sqlx/Postgres.

mod result_repository;
mod session_repository;

pub use result_repository::PgResultRepository;
pub use session_repository::PgSessionRepository;
