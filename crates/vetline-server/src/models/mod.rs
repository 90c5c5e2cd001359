//! Vetline API Models
//!
//! Request/response DTOs and the parsing of provider webhook payloads into
//! domain call events.

mod assessment;
mod initiate;
mod telephony;

pub use assessment::*;
pub use initiate::*;
pub use telephony::*;
