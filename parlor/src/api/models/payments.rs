//! API request/response models for deposits.

use crate::db::models::payments::{PaymentDBResponse, PaymentStatus};
use crate::types::PaymentId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Request to start a deposit
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DepositCreateRequest {
    /// Amount to deposit; must be positive
    #[schema(value_type = f64)]
    pub amount: Decimal,
}

/// Response for a freshly created checkout
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckoutResponse {
    /// Ledger row created for this deposit
    #[schema(value_type = String, format = "uuid")]
    pub payment_id: PaymentId,
    /// Hosted checkout page to redirect the user to
    pub checkout_url: String,
}

/// A deposit ledger row
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DepositResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: PaymentId,
    pub provider: String,
    pub provider_payment_id: String,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl From<PaymentDBResponse> for DepositResponse {
    fn from(db: PaymentDBResponse) -> Self {
        Self {
            id: db.id,
            provider: db.provider,
            provider_payment_id: db.provider_payment_id,
            amount: db.amount,
            status: db.status,
            created_at: db.created_at,
            confirmed_at: db.confirmed_at,
        }
    }
}

/// Query parameters for listing deposits
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListDepositsQuery {
    /// Number of rows to skip
    pub skip: Option<i64>,
    /// Maximum number of rows to return
    pub limit: Option<i64>,
}
