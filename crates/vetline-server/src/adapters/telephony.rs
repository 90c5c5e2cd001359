//! Telephony Provider Adapter
//!
//! Places outbound calls through the provider's REST API and verifies the
//! HMAC-SHA256 signature the provider attaches to inbound webhooks.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use vetline::domain::{DomainError, PhoneNumber};
use vetline::ports::TelephonyGateway;

use crate::config::TelephonyConfig;

/// Signature header attached by the provider to inbound webhooks.
pub const SIGNATURE_HEADER: &str = "x-telephony-signature";

/// REST implementation of TelephonyGateway
pub struct RestTelephonyGateway {
    client: Client,
    config: TelephonyConfig,
}

#[derive(Debug, Deserialize)]
struct CallCreated {
    sid: String,
}

impl RestTelephonyGateway {
    pub fn new(config: TelephonyConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self { client, config }
    }

    /// Verify an inbound webhook signature against the raw request body.
    /// Skipped when no webhook secret is configured.
    pub fn verify_signature(
        &self,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<(), DomainError> {
        let Some(secret) = &self.config.webhook_secret else {
            return Ok(());
        };
        let Some(signature) = signature else {
            return Err(DomainError::malformed("missing webhook signature"));
        };

        let expected = sign_payload(secret, body);
        if signature.trim() != expected {
            return Err(DomainError::malformed("webhook signature mismatch"));
        }
        Ok(())
    }
}

/// HMAC-SHA256 signature over a payload, hex encoded with a scheme prefix.
pub fn sign_payload(secret: &str, payload: &[u8]) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload);
    let result = mac.finalize();

    format!("sha256={}", hex::encode(result.into_bytes()))
}

#[async_trait]
impl TelephonyGateway for RestTelephonyGateway {
    async fn place_call(
        &self,
        to: &PhoneNumber,
        callback_base_url: &str,
        assessment_id: &str,
    ) -> Result<String, DomainError> {
        let url = format!(
            "{}/Accounts/{}/Calls",
            self.config.api_url, self.config.account_id
        );
        let answer_url = format!(
            "{callback_base_url}/webhook/answered?assessment_id={assessment_id}"
        );
        let status_url =
            format!("{callback_base_url}/webhook/status?assessment_id={assessment_id}");

        let form: Vec<(&str, &str)> = vec![
            ("To", to.as_str()),
            ("From", &self.config.from_number),
            ("Url", &answer_url),
            ("Method", "POST"),
            ("StatusCallback", &status_url),
            ("StatusCallbackMethod", "POST"),
            ("StatusCallbackEvent", "completed"),
            ("StatusCallbackEvent", "failed"),
            ("StatusCallbackEvent", "busy"),
            ("StatusCallbackEvent", "no-answer"),
        ];

        tracing::info!(assessment_id, to = %to, "placing outbound assessment call");

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.account_id, Some(&self.config.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|e| DomainError::ExternalService(format!("call placement failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::ExternalService(format!(
                "provider rejected call ({status}): {body}"
            )));
        }

        let created: CallCreated = response
            .json()
            .await
            .map_err(|e| DomainError::ExternalService(format!("invalid provider response: {e}")))?;

        Ok(created.sid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: Option<&str>) -> TelephonyConfig {
        TelephonyConfig {
            api_url: "https://api.telephony.test/v1".to_string(),
            account_id: "AC123".to_string(),
            auth_token: "token".to_string(),
            from_number: "+14722368895".to_string(),
            webhook_secret: secret.map(|s| s.to_string()),
        }
    }

    #[test]
    fn test_sign_payload() {
        let signature = sign_payload("test-secret", b"test payload");
        assert!(signature.starts_with("sha256="));
        assert_eq!(signature.len(), 7 + 64); // "sha256=" + 64 hex chars
    }

    #[test]
    fn test_verify_signature_round_trip() {
        let gateway = RestTelephonyGateway::new(config(Some("s3cret")));
        let body = b"CallSid=CA1&Digits=%23";
        let signature = sign_payload("s3cret", body);

        assert!(gateway.verify_signature(body, Some(&signature)).is_ok());
        assert!(gateway
            .verify_signature(body, Some("sha256=deadbeef"))
            .is_err());
        assert!(gateway.verify_signature(body, None).is_err());
    }

    #[test]
    fn test_verification_skipped_without_secret() {
        let gateway = RestTelephonyGateway::new(config(None));
        assert!(gateway.verify_signature(b"anything", None).is_ok());
    }
}
