//! Payment provider abstraction layer
//!
//! This module defines the `PaymentProvider` trait which abstracts the hosted
//! checkout and webhook surface of external payment gateways.

use async_trait::async_trait;
use axum::http::StatusCode;
use rust_decimal::Decimal;

use crate::{api::models::users::CurrentUser, config::PaymentConfig, types::UserId};

pub mod dummy;
pub mod ghostspay;

/// Create a payment provider from configuration
///
/// This is the single point where we convert config into provider instances.
/// Adding a new provider requires adding a match arm here.
pub fn create_provider(config: PaymentConfig) -> Box<dyn PaymentProvider> {
    match config {
        PaymentConfig::Ghostspay(ghostspay_config) => Box::new(ghostspay::GhostsPayProvider::from(ghostspay_config)),
        PaymentConfig::Dummy(dummy_config) => Box::new(dummy::DummyProvider::from(dummy_config)),
    }
}

/// Result type for payment provider operations
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Errors that can occur during payment processing
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment provider API error: {0}")]
    ProviderApi(String),

    #[error("Webhook signature verification failed")]
    InvalidSignature,

    #[error("Invalid payment data: {0}")]
    InvalidData(String),
}

impl From<PaymentError> for StatusCode {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::InvalidSignature => StatusCode::UNAUTHORIZED,
            PaymentError::InvalidData(_) => StatusCode::BAD_REQUEST,
            PaymentError::ProviderApi(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<PaymentError> for crate::errors::Error {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::InvalidSignature => crate::errors::Error::Unauthenticated {
                message: Some("Invalid webhook signature".to_string()),
            },
            PaymentError::InvalidData(message) => crate::errors::Error::BadRequest { message },
            PaymentError::ProviderApi(message) => crate::errors::Error::Provider { message },
        }
    }
}

/// A checkout created at the gateway, ready for the user to be redirected to
#[derive(Debug, Clone)]
pub struct CheckoutIntent {
    /// The gateway's id for this payment (ledger key)
    pub provider_payment_id: String,
    /// Hosted checkout page the user completes payment on
    pub checkout_url: String,
}

/// A validated webhook event from a payment provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEvent {
    /// The gateway's id for the payment this event reports on
    pub provider_payment_id: String,
    /// Gateway status string, e.g. "paid"
    pub status: String,
    /// Amount paid
    pub amount: Decimal,
    /// The user to credit, from checkout metadata
    pub user_id: UserId,
    /// Raw payload, kept on the ledger row for audit
    pub raw: serde_json::Value,
}

impl WebhookEvent {
    /// Whether this event reports a completed payment
    pub fn is_paid(&self) -> bool {
        self.status == "paid"
    }
}

/// Abstract payment provider interface
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Provider name as it appears in the webhook route path
    fn name(&self) -> &'static str;

    /// Create a hosted checkout for `amount` on behalf of `user`.
    ///
    /// Returns the gateway payment id (stored on the pending ledger row) and
    /// the URL the user should be redirected to.
    async fn create_checkout(&self, user: &CurrentUser, amount: Decimal) -> Result<CheckoutIntent>;

    /// Validate and extract a webhook event from raw request data.
    ///
    /// Authenticity checks (signature/shared secret) happen here, before any
    /// payload field is trusted. Fails with `InvalidSignature` on a bad or
    /// missing signature and `InvalidData` on a malformed payload.
    fn verify_webhook(&self, headers: &axum::http::HeaderMap, body: &str) -> Result<WebhookEvent>;
}
