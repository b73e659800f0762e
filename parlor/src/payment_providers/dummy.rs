//! Dummy payment provider implementation
//!
//! Stands in for a real gateway during development and testing: checkouts
//! resolve to a local URL and webhooks are accepted without a signature.
//! Never configure this in production.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    api::models::users::CurrentUser,
    config::DummyConfig,
    payment_providers::{CheckoutIntent, PaymentError, PaymentProvider, Result, WebhookEvent},
    types::UserId,
};

/// Dummy payment provider
pub struct DummyProvider;

impl From<DummyConfig> for DummyProvider {
    fn from(_config: DummyConfig) -> Self {
        Self
    }
}

#[derive(Debug, Deserialize)]
struct DummyEvent {
    id: String,
    status: String,
    amount: Decimal,
    metadata: DummyMetadata,
}

#[derive(Debug, Deserialize)]
struct DummyMetadata {
    user_id: UserId,
}

#[async_trait]
impl PaymentProvider for DummyProvider {
    fn name(&self) -> &'static str {
        "dummy"
    }

    async fn create_checkout(&self, user: &CurrentUser, amount: Decimal) -> Result<CheckoutIntent> {
        // Unique id embedding the user, mirroring what a real gateway would mint
        let provider_payment_id = format!("dummy_{}_{}", user.id, uuid::Uuid::new_v4());

        tracing::info!("Dummy provider created checkout {} for user {} ({amount})", provider_payment_id, user.id);

        Ok(CheckoutIntent {
            checkout_url: format!("/deposit/complete?payment_id={provider_payment_id}"),
            provider_payment_id,
        })
    }

    fn verify_webhook(&self, _headers: &axum::http::HeaderMap, body: &str) -> Result<WebhookEvent> {
        // No signature: the dummy gateway trusts anything well-formed
        let raw: serde_json::Value =
            serde_json::from_str(body).map_err(|e| PaymentError::InvalidData(format!("malformed webhook payload: {e}")))?;
        let event: DummyEvent =
            serde_json::from_value(raw.clone()).map_err(|e| PaymentError::InvalidData(format!("malformed webhook payload: {e}")))?;

        Ok(WebhookEvent {
            provider_payment_id: event.id,
            status: event.status,
            amount: event.amount,
            user_id: event.metadata.user_id,
            raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_checkout_ids_are_unique_per_call() {
        let provider = DummyProvider;
        let user = CurrentUser {
            id: Uuid::new_v4(),
            username: "player".to_string(),
            email: "player@example.com".to_string(),
            is_admin: false,
        };

        let a = provider.create_checkout(&user, Decimal::from(10)).await.unwrap();
        let b = provider.create_checkout(&user, Decimal::from(10)).await.unwrap();
        assert_ne!(a.provider_payment_id, b.provider_payment_id);
        assert!(a.provider_payment_id.starts_with("dummy_"));
    }

    #[test]
    fn test_verify_webhook_accepts_unsigned_payload() {
        let provider = DummyProvider;
        let user_id = Uuid::new_v4();
        let body = format!(r#"{{"id":"dummy_1","status":"paid","amount":50,"metadata":{{"user_id":"{user_id}"}}}}"#);

        let event = provider.verify_webhook(&axum::http::HeaderMap::new(), &body).unwrap();
        assert_eq!(event.user_id, user_id);
        assert!(event.is_paid());
    }

    #[test]
    fn test_verify_webhook_rejects_garbage() {
        let provider = DummyProvider;
        let result = provider.verify_webhook(&axum::http::HeaderMap::new(), "not json");
        assert!(matches!(result, Err(PaymentError::InvalidData(_))));
    }
}
