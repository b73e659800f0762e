//! HTTP handlers for deposits and the gateway webhook.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde_json::json;

use crate::{
    AppState,
    api::models::{
        payments::{CheckoutResponse, DepositCreateRequest, DepositResponse, ListDepositsQuery},
        users::CurrentUser,
    },
    db::{
        errors::DbError,
        handlers::Payments,
        models::payments::{ConfirmOutcome, DepositConfirmDBRequest, DepositCreateDBRequest},
    },
    errors::Error,
    payment_providers,
};

const DEFAULT_PAGE_SIZE: i64 = 50;

/// Start a deposit: create a hosted checkout and a pending ledger row
#[utoipa::path(
    post,
    path = "/deposits",
    request_body = DepositCreateRequest,
    tag = "payments",
    responses(
        (status = 200, description = "Checkout created", body = CheckoutResponse),
        (status = 400, description = "Invalid amount"),
        (status = 401, description = "Not authenticated"),
        (status = 501, description = "No payment provider configured"),
        (status = 502, description = "Payment provider unavailable"),
    ),
    security(
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_deposit(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<DepositCreateRequest>,
) -> Result<Response, Error> {
    // Validate before touching the gateway or the ledger
    if request.amount <= Decimal::ZERO {
        return Err(Error::BadRequest {
            message: "Deposit amount must be positive".to_string(),
        });
    }

    let Some(payment_config) = state.config.payment.clone() else {
        tracing::warn!("Deposit requested but no payment provider is configured");
        let error_response = Json(json!({
            "error": "No payment provider configured",
            "message": "Sorry, there's no payment provider setup. Please contact support."
        }));
        return Ok((StatusCode::NOT_IMPLEMENTED, error_response).into_response());
    };

    let provider = payment_providers::create_provider(payment_config);
    let intent = provider.create_checkout(&user, request.amount).await?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut payments = Payments::new(&mut conn);

    let payment = payments
        .create_pending(&DepositCreateDBRequest {
            user_id: user.id,
            provider: provider.name().to_string(),
            provider_payment_id: intent.provider_payment_id,
            amount: request.amount,
        })
        .await?;

    tracing::info!("Created checkout {} for user {}", payment.provider_payment_id, user.id);

    Ok(Json(CheckoutResponse {
        payment_id: payment.id,
        checkout_url: intent.checkout_url,
    })
    .into_response())
}

/// List the caller's deposit ledger rows, newest first
#[utoipa::path(
    get,
    path = "/deposits",
    params(ListDepositsQuery),
    tag = "payments",
    responses(
        (status = 200, description = "Deposit history", body = [DepositResponse]),
        (status = 401, description = "Not authenticated"),
    ),
    security(
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn list_deposits(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListDepositsQuery>,
) -> Result<Json<Vec<DepositResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut payments = Payments::new(&mut conn);

    let rows = payments
        .list_for_user(&crate::db::handlers::payments::PaymentFilter {
            user_id: user.id,
            skip: query.skip.unwrap_or(0).max(0),
            limit: query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 200),
        })
        .await?;

    Ok(Json(rows.into_iter().map(DepositResponse::from).collect()))
}

/// Gateway webhook: reconcile a payment event against the ledger.
///
/// Always answers 200 for events it has decided not to act on (non-paid
/// statuses, duplicates, unknown users) so the gateway stops redelivering;
/// authenticity failures answer 401 so a misconfigured secret is noticed.
#[utoipa::path(
    post,
    path = "/webhooks/{provider}",
    tag = "payments",
    responses(
        (status = 200, description = "Event acknowledged"),
        (status = 400, description = "Malformed payload"),
        (status = 401, description = "Invalid signature"),
        (status = 404, description = "Unknown provider"),
    )
)]
#[tracing::instrument(skip_all, fields(provider = %provider_name))]
pub async fn webhook_handler(
    State(state): State<AppState>,
    Path(provider_name): Path<String>,
    headers: HeaderMap,
    body: String,
) -> Result<Response, Error> {
    let Some(payment_config) = state.config.payment.clone() else {
        tracing::warn!("Webhook received but no payment provider is configured");
        return Ok(StatusCode::NOT_IMPLEMENTED.into_response());
    };

    if provider_name != payment_config.provider_name() {
        return Err(Error::NotFound {
            resource: "webhook provider".to_string(),
            id: provider_name,
        });
    }

    let provider = payment_providers::create_provider(payment_config);

    // Authenticity first: nothing in the payload is trusted until this passes
    let event = provider.verify_webhook(&headers, &body)?;

    if !event.is_paid() {
        tracing::debug!("Ignoring webhook event with status {:?} for {}", event.status, event.provider_payment_id);
        return Ok(Json(json!({ "status": "ignored" })).into_response());
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut payments = Payments::new(&mut conn);

    let request = DepositConfirmDBRequest {
        user_id: event.user_id,
        provider: provider.name().to_string(),
        provider_payment_id: event.provider_payment_id.clone(),
        amount: event.amount,
        payload: event.raw,
    };

    match payments.confirm_deposit(&request).await {
        Ok(ConfirmOutcome::Credited { payment, balance }) => {
            tracing::info!(
                "Confirmed deposit {} for user {}: +{} (balance {})",
                payment.provider_payment_id,
                payment.user_id,
                payment.amount,
                balance
            );
        }
        Ok(ConfirmOutcome::AlreadyProcessed) => {
            tracing::debug!(
                "Duplicate delivery for payment {}, already confirmed (idempotent)",
                event.provider_payment_id
            );
        }
        // Two deliveries raced the insert itself: someone else confirmed it
        Err(DbError::UniqueViolation { constraint, .. })
            if constraint.as_deref() == Some("payments_provider_payment_id_unique") =>
        {
            tracing::debug!(
                "Concurrent delivery for payment {} lost the insert race (idempotent)",
                event.provider_payment_id
            );
        }
        // The gateway knows a user we don't; acknowledge so it stops retrying
        Err(DbError::NotFound) => {
            tracing::warn!(
                "Webhook for payment {} references unknown user {}, not credited",
                event.provider_payment_id,
                event.user_id
            );
        }
        Err(e) => return Err(Error::Database(e)),
    }

    Ok(Json(json!({ "status": "ok" })).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DummyConfig, GhostsPayConfig, PaymentConfig};
    use crate::test_utils::{session_cookie_for, test_config, test_state_with_config, test_user};
    use axum_test::TestServer;

    fn ghostspay_config() -> PaymentConfig {
        PaymentConfig::Ghostspay(GhostsPayConfig {
            api_key: "gp_test".to_string(),
            company_id: "company_1".to_string(),
            webhook_secret: "whsec_test".to_string(),
            api_base: "https://api.ghostspay.test/v1".to_string(),
        })
    }

    fn payments_router(state: AppState) -> axum::Router {
        axum::Router::new()
            .route("/deposits", axum::routing::post(create_deposit))
            .route("/webhooks/{provider}", axum::routing::post(webhook_handler))
            .with_state(state)
    }

    #[tokio::test]
    async fn test_create_deposit_requires_session() {
        let mut config = test_config();
        config.payment = Some(ghostspay_config());
        let server = TestServer::new(payments_router(test_state_with_config(config))).unwrap();

        let response = server
            .post("/deposits")
            .json(&serde_json::json!({ "amount": 50 }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_deposit_rejects_non_positive_amounts() {
        let mut config = test_config();
        config.payment = Some(ghostspay_config());
        let cookie = session_cookie_for(&test_user(), &config);
        let server = TestServer::new(payments_router(test_state_with_config(config))).unwrap();

        for amount in [0, -10] {
            let response = server
                .post("/deposits")
                .add_header("cookie", cookie.as_str())
                .json(&serde_json::json!({ "amount": amount }))
                .await;
            response.assert_status(StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_create_deposit_without_provider_is_not_implemented() {
        let config = test_config();
        let cookie = session_cookie_for(&test_user(), &config);
        let server = TestServer::new(payments_router(test_state_with_config(config))).unwrap();

        let response = server
            .post("/deposits")
            .add_header("cookie", cookie.as_str())
            .json(&serde_json::json!({ "amount": 50 }))
            .await;
        response.assert_status(StatusCode::NOT_IMPLEMENTED);
    }

    #[tokio::test]
    async fn test_webhook_unknown_provider_is_not_found() {
        let mut config = test_config();
        config.payment = Some(ghostspay_config());
        let server = TestServer::new(payments_router(test_state_with_config(config))).unwrap();

        let response = server.post("/webhooks/stripe").text("{}").await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_webhook_rejects_missing_signature() {
        let mut config = test_config();
        config.payment = Some(ghostspay_config());
        let server = TestServer::new(payments_router(test_state_with_config(config))).unwrap();

        let user_id = uuid::Uuid::new_v4();
        let body = format!(r#"{{"id":"pay_1","status":"paid","amount":50,"metadata":{{"user_id":"{user_id}"}}}}"#);

        let response = server.post("/webhooks/ghostspay").text(body).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_webhook_rejects_tampered_body() {
        use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
        use hmac::{Hmac, Mac};
        use sha2::Sha256;

        let mut config = test_config();
        config.payment = Some(ghostspay_config());
        let server = TestServer::new(payments_router(test_state_with_config(config))).unwrap();

        let user_id = uuid::Uuid::new_v4();
        let signed_body = format!(r#"{{"id":"pay_1","status":"paid","amount":50,"metadata":{{"user_id":"{user_id}"}}}}"#);
        let mut mac = Hmac::<Sha256>::new_from_slice(b"whsec_test").unwrap();
        mac.update(signed_body.as_bytes());
        let signature = BASE64_STANDARD.encode(mac.finalize().into_bytes());

        // Deliver a different body under the valid signature
        let tampered = format!(r#"{{"id":"pay_1","status":"paid","amount":5000,"metadata":{{"user_id":"{user_id}"}}}}"#);
        let response = server
            .post("/webhooks/ghostspay")
            .add_header("x-signature", signature)
            .text(tampered)
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_webhook_without_provider_is_not_implemented() {
        let config = test_config();
        let server = TestServer::new(payments_router(test_state_with_config(config))).unwrap();

        let response = server.post("/webhooks/ghostspay").text("{}").await;
        response.assert_status(StatusCode::NOT_IMPLEMENTED);
    }

    #[tokio::test]
    async fn test_dummy_webhook_ignores_unpaid_events() {
        let mut config = test_config();
        config.payment = Some(PaymentConfig::Dummy(DummyConfig::default()));
        let server = TestServer::new(payments_router(test_state_with_config(config))).unwrap();

        let user_id = uuid::Uuid::new_v4();
        let body = format!(r#"{{"id":"dummy_1","status":"pending","amount":50,"metadata":{{"user_id":"{user_id}"}}}}"#);

        let response = server.post("/webhooks/dummy").text(body).await;
        response.assert_status_ok();
        let value: serde_json::Value = response.json();
        assert_eq!(value["status"], "ignored");
    }
}
