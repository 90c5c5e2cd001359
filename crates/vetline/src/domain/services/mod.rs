//! Domain Services
//!
//! Pure domain logic with no I/O: rubric aggregation and the overall
//! recommendation rule.

pub mod scoring;
