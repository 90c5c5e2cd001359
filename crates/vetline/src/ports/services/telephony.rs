//! Telephony Gateway Port
//!
//! Abstract interface for the outbound-calling provider. The gateway places
//! calls; everything afterwards arrives as webhooks.

use async_trait::async_trait;

use crate::domain::{DomainError, PhoneNumber};

/// Outbound-calling provider interface
#[async_trait]
pub trait TelephonyGateway: Send + Sync {
    /// Place an outbound call to the candidate. The provider will deliver
    /// call progress to the webhook URLs derived from `callback_base_url`.
    /// Returns the provider's call identifier.
    async fn place_call(
        &self,
        to: &PhoneNumber,
        callback_base_url: &str,
        assessment_id: &str,
    ) -> Result<String, DomainError>;
}
