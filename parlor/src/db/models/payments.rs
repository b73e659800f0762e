//! Database models for the deposit ledger.

use crate::types::{PaymentId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Payment status stored as TEXT in the database
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Confirmed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Confirmed => "confirmed",
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "confirmed" => Ok(PaymentStatus::Confirmed),
            other => Err(format!("unknown payment status: {other}")),
        }
    }
}

/// Database request for recording a new pending deposit (checkout created)
#[derive(Debug, Clone)]
pub struct DepositCreateDBRequest {
    pub user_id: UserId,
    pub provider: String,
    pub provider_payment_id: String,
    pub amount: Decimal,
}

/// Database request for confirming a deposit from a gateway webhook
#[derive(Debug, Clone)]
pub struct DepositConfirmDBRequest {
    pub user_id: UserId,
    pub provider: String,
    pub provider_payment_id: String,
    pub amount: Decimal,
    /// Raw webhook payload, kept for audit
    pub payload: serde_json::Value,
}

/// Database response for a deposit ledger row
#[derive(Debug, Clone)]
pub struct PaymentDBResponse {
    pub id: PaymentId,
    pub user_id: UserId,
    pub provider: String,
    pub provider_payment_id: String,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

/// Outcome of a webhook confirmation attempt.
///
/// `AlreadyProcessed` is the idempotent no-op path: the ledger row for this
/// provider payment id was confirmed by an earlier delivery and no balance
/// was touched this time.
#[derive(Debug)]
pub enum ConfirmOutcome {
    /// Newly confirmed: the user's balance was credited with the new balance returned
    Credited { payment: PaymentDBResponse, balance: Decimal },
    /// Duplicate delivery: no side effects
    AlreadyProcessed,
}
