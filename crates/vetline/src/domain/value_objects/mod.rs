//! Value Objects
//!
//! Immutable value types shared across the domain.

mod phone;
mod recommendation;
mod tier;

pub use phone::*;
pub use recommendation::*;
pub use tier::*;
