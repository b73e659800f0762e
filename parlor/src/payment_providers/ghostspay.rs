//! GhostsPay payment provider implementation.
//!
//! Checkouts are created with `POST {api_base}/payments`; the gateway calls
//! back on our webhook with an `X-Signature` header carrying a base64
//! HMAC-SHA256 of the raw body, keyed by the shared webhook secret. The MAC
//! comparison is constant-time.

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::{
    api::models::users::CurrentUser,
    config::GhostsPayConfig,
    payment_providers::{CheckoutIntent, PaymentError, PaymentProvider, Result, WebhookEvent},
    types::UserId,
};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the webhook body signature
pub const SIGNATURE_HEADER: &str = "x-signature";

/// GhostsPay payment provider
pub struct GhostsPayProvider {
    api_key: String,
    company_id: String,
    webhook_secret: String,
    api_base: String,
    http: reqwest::Client,
}

impl From<GhostsPayConfig> for GhostsPayProvider {
    fn from(config: GhostsPayConfig) -> Self {
        Self::new(config.api_key, config.company_id, config.webhook_secret, config.api_base)
    }
}

/// Checkout creation request body
#[derive(Debug, Serialize)]
struct CreatePaymentRequest<'a> {
    amount: Decimal,
    company_id: &'a str,
    description: &'a str,
    metadata: PaymentMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
struct PaymentMetadata {
    user_id: UserId,
}

/// Checkout creation response body
#[derive(Debug, Deserialize)]
struct CreatePaymentResponse {
    id: String,
    payment_url: String,
}

/// Webhook event payload: `{id, status, amount, metadata: {user_id}}`
#[derive(Debug, Deserialize)]
struct GhostsPayEvent {
    id: String,
    status: String,
    amount: Decimal,
    metadata: PaymentMetadata,
}

impl GhostsPayProvider {
    pub fn new(api_key: String, company_id: String, webhook_secret: String, api_base: String) -> Self {
        Self {
            api_key,
            company_id,
            webhook_secret,
            api_base,
            http: reqwest::Client::new(),
        }
    }

    /// Compute the expected signature for a webhook body
    fn sign_body(&self, body: &str) -> String {
        // new_from_slice only fails on zero-length keys, which config validation rejects
        let mut mac = HmacSha256::new_from_slice(self.webhook_secret.as_bytes()).expect("HMAC accepts any key length");
        mac.update(body.as_bytes());
        BASE64_STANDARD.encode(mac.finalize().into_bytes())
    }

    /// Verify a webhook body against its `X-Signature` header value.
    ///
    /// Comparison happens on the decoded MAC bytes via `Mac::verify_slice`,
    /// which is constant-time.
    fn verify_body_signature(&self, body: &str, signature: &str) -> bool {
        let Ok(provided) = BASE64_STANDARD.decode(signature) else {
            return false;
        };

        let mut mac = HmacSha256::new_from_slice(self.webhook_secret.as_bytes()).expect("HMAC accepts any key length");
        mac.update(body.as_bytes());
        mac.verify_slice(&provided).is_ok()
    }
}

#[async_trait]
impl PaymentProvider for GhostsPayProvider {
    fn name(&self) -> &'static str {
        "ghostspay"
    }

    async fn create_checkout(&self, user: &CurrentUser, amount: Decimal) -> Result<CheckoutIntent> {
        let request = CreatePaymentRequest {
            amount,
            company_id: &self.company_id,
            description: "Casino deposit",
            metadata: PaymentMetadata { user_id: user.id },
        };

        let response = self
            .http
            .post(format!("{}/payments", self.api_base))
            .bearer_auth(&self.api_key)
            .timeout(std::time::Duration::from_secs(30))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach GhostsPay: {:?}", e);
                PaymentError::ProviderApi(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!("GhostsPay checkout creation returned {}", status);
            return Err(PaymentError::ProviderApi(format!("checkout creation returned {status}")));
        }

        let payment: CreatePaymentResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse GhostsPay checkout response: {:?}", e);
            PaymentError::ProviderApi(e.to_string())
        })?;

        tracing::info!("Created GhostsPay payment {} for user {}", payment.id, user.id);

        Ok(CheckoutIntent {
            provider_payment_id: payment.id,
            checkout_url: payment.payment_url,
        })
    }

    fn verify_webhook(&self, headers: &axum::http::HeaderMap, body: &str) -> Result<WebhookEvent> {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .ok_or(PaymentError::InvalidSignature)?
            .to_str()
            .map_err(|_| PaymentError::InvalidSignature)?;

        if !self.verify_body_signature(body, signature) {
            tracing::warn!("Rejected GhostsPay webhook with bad signature");
            return Err(PaymentError::InvalidSignature);
        }

        let raw: serde_json::Value =
            serde_json::from_str(body).map_err(|e| PaymentError::InvalidData(format!("malformed webhook payload: {e}")))?;
        let event: GhostsPayEvent =
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
    use axum::http::HeaderMap;
    use uuid::Uuid;

    fn test_provider() -> GhostsPayProvider {
        GhostsPayProvider::new(
            "gp_test_key".to_string(),
            "company_123".to_string(),
            "whsec_test_secret".to_string(),
            "https://api.ghostspay.test/v1".to_string(),
        )
    }

    fn event_body(user_id: Uuid) -> String {
        format!(r#"{{"id":"pay_123","status":"paid","amount":50,"metadata":{{"user_id":"{user_id}"}}}}"#)
    }

    fn headers_with_signature(signature: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(SIGNATURE_HEADER, signature.parse().unwrap());
        headers
    }

    #[test]
    fn test_verify_webhook_accepts_valid_signature() {
        let provider = test_provider();
        let body = event_body(Uuid::new_v4());
        let signature = provider.sign_body(&body);

        let event = provider.verify_webhook(&headers_with_signature(&signature), &body).unwrap();
        assert_eq!(event.provider_payment_id, "pay_123");
        assert_eq!(event.status, "paid");
        assert!(event.is_paid());
        assert_eq!(event.amount, Decimal::from(50));
    }

    #[test]
    fn test_verify_webhook_rejects_wrong_signature() {
        let provider = test_provider();
        let body = event_body(Uuid::new_v4());

        // Signature over a different body
        let signature = provider.sign_body("other body");
        let result = provider.verify_webhook(&headers_with_signature(&signature), &body);
        assert!(matches!(result, Err(PaymentError::InvalidSignature)));
    }

    #[test]
    fn test_verify_webhook_rejects_wrong_secret() {
        let provider = test_provider();
        let other = GhostsPayProvider::new(
            "gp_test_key".to_string(),
            "company_123".to_string(),
            "whsec_other_secret".to_string(),
            "https://api.ghostspay.test/v1".to_string(),
        );
        let body = event_body(Uuid::new_v4());

        let signature = other.sign_body(&body);
        let result = provider.verify_webhook(&headers_with_signature(&signature), &body);
        assert!(matches!(result, Err(PaymentError::InvalidSignature)));
    }

    #[test]
    fn test_verify_webhook_rejects_missing_or_garbage_header() {
        let provider = test_provider();
        let body = event_body(Uuid::new_v4());

        let result = provider.verify_webhook(&HeaderMap::new(), &body);
        assert!(matches!(result, Err(PaymentError::InvalidSignature)));

        let result = provider.verify_webhook(&headers_with_signature("not-base64!!!"), &body);
        assert!(matches!(result, Err(PaymentError::InvalidSignature)));
    }

    #[test]
    fn test_verify_webhook_rejects_malformed_payload() {
        let provider = test_provider();

        // Valid signature over a body that isn't a payment event
        let body = r#"{"unexpected":"shape"}"#;
        let signature = provider.sign_body(body);
        let result = provider.verify_webhook(&headers_with_signature(&signature), body);
        assert!(matches!(result, Err(PaymentError::InvalidData(_))));
    }

    #[test]
    fn test_non_paid_status_is_parsed_but_not_paid() {
        let provider = test_provider();
        let user_id = Uuid::new_v4();
        let body = format!(r#"{{"id":"pay_9","status":"refused","amount":10,"metadata":{{"user_id":"{user_id}"}}}}"#);
        let signature = provider.sign_body(&body);

        let event = provider.verify_webhook(&headers_with_signature(&signature), &body).unwrap();
        assert!(!event.is_paid());
    }

    #[tokio::test]
    async fn test_create_checkout_posts_to_gateway() {
        use wiremock::matchers::{bearer_token, body_partial_json, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        let user = CurrentUser {
            id: Uuid::new_v4(),
            username: "player".to_string(),
            email: "player@example.com".to_string(),
            is_admin: false,
        };

        Mock::given(method("POST"))
            .and(path("/payments"))
            .and(bearer_token("gp_test_key"))
            .and(body_partial_json(serde_json::json!({
                "company_id": "company_123",
                "metadata": { "user_id": user.id },
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "pay_abc",
                "payment_url": "https://checkout.ghostspay.test/pay_abc",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = GhostsPayProvider::new(
            "gp_test_key".to_string(),
            "company_123".to_string(),
            "whsec_test_secret".to_string(),
            server.uri(),
        );

        let intent = provider.create_checkout(&user, Decimal::from(25)).await.unwrap();
        assert_eq!(intent.provider_payment_id, "pay_abc");
        assert_eq!(intent.checkout_url, "https://checkout.ghostspay.test/pay_abc");
    }

    #[tokio::test]
    async fn test_create_checkout_surfaces_gateway_errors() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/payments"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let provider = GhostsPayProvider::new(
            "gp_test_key".to_string(),
            "company_123".to_string(),
            "whsec_test_secret".to_string(),
            server.uri(),
        );

        let user = CurrentUser {
            id: Uuid::new_v4(),
            username: "player".to_string(),
            email: "player@example.com".to_string(),
            is_admin: false,
        };

        let result = provider.create_checkout(&user, Decimal::from(25)).await;
        assert!(matches!(result, Err(PaymentError::ProviderApi(_))));
    }
}
