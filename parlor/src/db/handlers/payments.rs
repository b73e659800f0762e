//! Database repository for the deposit ledger.
//!
//! Webhook reconciliation lives here: [`Payments::confirm_deposit`] performs
//! the confirm-and-credit as one transaction, with the
//! `payments_provider_payment_id_unique` constraint standing in for any
//! check-then-act duplicate guard. A provider payment id credits a balance at
//! most once regardless of how many times (or how concurrently) the gateway
//! delivers the event.

use crate::db::{
    errors::{DbError, Result},
    models::payments::{ConfirmOutcome, DepositConfirmDBRequest, DepositCreateDBRequest, PaymentDBResponse, PaymentStatus},
};
use crate::types::{PaymentId, UserId, abbrev_uuid};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Connection, FromRow, PgConnection};
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing deposits
#[derive(Debug, Clone)]
pub struct PaymentFilter {
    pub user_id: UserId,
    pub skip: i64,
    pub limit: i64,
}

// Database entity model for a ledger row
#[derive(Debug, Clone, FromRow)]
struct Payment {
    pub id: PaymentId,
    pub user_id: UserId,
    pub provider: String,
    pub provider_payment_id: String,
    pub amount: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl From<Payment> for PaymentDBResponse {
    fn from(p: Payment) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            provider: p.provider,
            provider_payment_id: p.provider_payment_id,
            amount: p.amount,
            // The status column is constrained to known values
            status: p.status.parse().unwrap_or(PaymentStatus::Pending),
            created_at: p.created_at,
            confirmed_at: p.confirmed_at,
        }
    }
}

const PAYMENT_COLUMNS: &str = "id, user_id, provider, provider_payment_id, amount, status, created_at, confirmed_at";

pub struct Payments<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Payments<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Record a pending ledger row for a freshly created checkout.
    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id), provider = %request.provider), err)]
    pub async fn create_pending(&mut self, request: &DepositCreateDBRequest) -> Result<PaymentDBResponse> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            INSERT INTO payments (id, user_id, provider, provider_payment_id, amount, status)
            VALUES ($1, $2, $3, $4, $5, 'pending')
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(request.user_id)
        .bind(&request.provider)
        .bind(&request.provider_payment_id)
        .bind(request.amount)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(PaymentDBResponse::from(payment))
    }

    /// Confirm a deposit reported by a gateway webhook and credit the user's
    /// balance, exactly once per provider payment id.
    ///
    /// The whole operation is a single transaction:
    ///
    /// 1. An atomic insert-or-confirm keyed on (provider, provider_payment_id).
    ///    Rows already in `confirmed` state match the conflict arm's WHERE
    ///    filter and return nothing, which is the idempotent no-op path.
    /// 2. If a row was newly confirmed, add the amount to the user's balance.
    ///
    /// A concurrent duplicate delivery either observes the confirmed status or
    /// blocks on the row lock until the first transaction commits, then
    /// observes it. Neither path credits twice.
    #[instrument(skip(self, request), fields(provider = %request.provider, payment = %request.provider_payment_id), err)]
    pub async fn confirm_deposit(&mut self, request: &DepositConfirmDBRequest) -> Result<ConfirmOutcome> {
        let mut tx = self.db.begin().await?;

        let confirmed = sqlx::query_as::<_, Payment>(&format!(
            r#"
            INSERT INTO payments (id, user_id, provider, provider_payment_id, amount, status, payload, confirmed_at)
            VALUES ($1, $2, $3, $4, $5, 'confirmed', $6, NOW())
            ON CONFLICT ON CONSTRAINT payments_provider_payment_id_unique
            DO UPDATE SET status = 'confirmed', amount = EXCLUDED.amount, payload = EXCLUDED.payload, confirmed_at = NOW()
            WHERE payments.status <> 'confirmed'
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(request.user_id)
        .bind(&request.provider)
        .bind(&request.provider_payment_id)
        .bind(request.amount)
        .bind(&request.payload)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(payment) = confirmed else {
            // Already confirmed by an earlier delivery - nothing to do
            tx.commit().await?;
            return Ok(ConfirmOutcome::AlreadyProcessed);
        };

        let balance: Decimal = sqlx::query_scalar(
            "UPDATE users SET balance = balance + $1, updated_at = NOW() WHERE id = $2 RETURNING balance",
        )
        .bind(payment.amount)
        .bind(payment.user_id)
        .fetch_optional(&mut *tx)
        .await?
        // Dropping the uncommitted transaction rolls the confirm back, so the
        // gateway's retry can land once the user exists
        .ok_or(DbError::NotFound)?;

        tx.commit().await?;

        Ok(ConfirmOutcome::Credited {
            payment: PaymentDBResponse::from(payment),
            balance,
        })
    }

    /// List a user's ledger rows, newest first
    #[instrument(skip(self, filter), fields(user_id = %abbrev_uuid(&filter.user_id), limit = filter.limit, skip = filter.skip), err)]
    pub async fn list_for_user(&mut self, filter: &PaymentFilter) -> Result<Vec<PaymentDBResponse>> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM payments
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            OFFSET $2
            LIMIT $3
            "#
        ))
        .bind(filter.user_id)
        .bind(filter.skip)
        .bind(filter.limit)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(payments.into_iter().map(PaymentDBResponse::from).collect())
    }
}
