//! # parlor: a small casino platform
//!
//! `parlor` is the backend for a small gambling website: player accounts with
//! balance tracking, deposits through a hosted payment gateway reconciled via
//! signed webhooks, a static catalog of game pages, and a server-settled dice
//! game.
//!
//! ## Overview
//!
//! Players register with an email and password and receive a JWT session
//! cookie. Deposits go through the configured payment provider's hosted
//! checkout; the gateway later reports the payment's fate on
//! `/webhooks/{provider}`, and the webhook handler credits the player's
//! balance **exactly once** per gateway payment id. That invariant is the
//! correctness core of the service and is enforced in the database: the
//! confirm-and-credit runs in a single transaction guarded by a unique
//! constraint on `(provider, provider_payment_id)`, so concurrent duplicate
//! deliveries cannot double-credit.
//!
//! Bets work the other way around: the dice endpoint validates the stake,
//! resolves the roll, and settles debit, payout, and the round log in one
//! transaction whose balance update refuses to overdraw.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for
//! the HTTP layer and uses PostgreSQL (via SQLx) for all persistence.
//!
//! The **API layer** ([`api`]) exposes authentication routes at
//! `/authentication/*`, account/deposit/game routes under `/api/v1/*`, and
//! the gateway webhook at `/webhooks/{provider}`.
//!
//! The **authentication layer** ([`auth`]) hashes passwords with Argon2id and
//! carries sessions in a signed JWT cookie; an extractor resolves the cookie
//! into a `CurrentUser` for handlers.
//!
//! The **database layer** ([`db`]) uses the repository pattern: each entity
//! (users, payments, game rounds) has a repository handling queries and
//! mutations, with multi-statement mutations wrapped in transactions.
//!
//! The **payment layer** ([`payment_providers`]) abstracts the gateway behind
//! a trait, with a GhostsPay implementation and a dummy provider for
//! development.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use parlor::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = parlor::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     parlor::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Database Setup
//!
//! The application requires a PostgreSQL database and automatically runs
//! migrations on startup. The initial admin account is created (or its
//! password refreshed) from `admin_email`/`admin_password` configuration.
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod games;
mod openapi;
mod payment_providers;
pub mod telemetry;
mod types;

#[cfg(test)]
pub mod test_utils;

use crate::{
    api::handlers,
    auth::password,
    db::handlers::Users,
    db::models::users::UserCreateDBRequest,
    openapi::ApiDoc,
};
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use bon::Builder;
pub use config::Config;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};

pub use types::{PaymentId, UserId};

/// Application state shared across all request handlers.
///
/// Holds the database pool and the loaded configuration; both are cheap to
/// clone (the pool is reference-counted).
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
}

/// Get the parlor database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial admin user if it doesn't exist.
///
/// This function is idempotent - it will create a new admin user if one
/// doesn't exist, or update the password if the user already exists. Called
/// during application startup so there's always an admin account available.
#[instrument(skip_all)]
pub async fn create_initial_admin_user(email: &str, password: Option<&str>, db: &PgPool) -> anyhow::Result<UserId> {
    // Hash password if provided
    let password_hash = match password {
        Some(pwd) => Some(password::hash_string(pwd).map_err(|e| anyhow::anyhow!("Failed to hash admin password: {e}"))?),
        None => None,
    };

    // Use a transaction to ensure atomicity
    let mut tx = db.begin().await?;
    let mut user_repo = Users::new(&mut tx);

    // Check if user already exists
    if let Some(existing_user) = user_repo
        .get_user_by_email(email)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to check existing admin user: {e}"))?
    {
        // User exists - update password if provided
        if let Some(password_hash) = password_hash {
            user_repo
                .update_password(existing_user.id, &password_hash)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to update admin password: {e}"))?;
        }
        tx.commit().await?;
        return Ok(existing_user.id);
    }

    // Create new admin user
    let user_create = UserCreateDBRequest {
        username: email.to_string(),
        email: email.to_string(),
        is_admin: true,
        password_hash,
        starting_balance: Decimal::ZERO,
    };

    let created_user = user_repo
        .create(&user_create)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create admin user: {e}"))?;

    tx.commit().await?;
    Ok(created_user.id)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors_config = &config.auth.security.cors;

    let allow_origin = if cors_config.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &cors_config.allowed_origins {
            origins.push(origin.parse::<HeaderValue>()?);
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(cors_config.allow_credentials);

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the main application router with all endpoints and middleware.
///
/// - Authentication routes (register, login, logout)
/// - Account, deposit, and game routes under `/api/v1`
/// - Gateway webhook at `/webhooks/{provider}`
/// - Interactive API docs at `/docs`
/// - CORS and tracing middleware
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    use utoipa::OpenApi;
    use utoipa_scalar::{Scalar, Servable};

    // Authentication routes at root level
    let auth_routes = Router::new()
        .route(
            "/authentication/register",
            get(handlers::auth::get_registration_info).post(handlers::auth::register),
        )
        .route(
            "/authentication/login",
            get(handlers::auth::get_login_info).post(handlers::auth::login),
        )
        .route("/authentication/logout", post(handlers::auth::logout))
        .with_state(state.clone());

    // API routes
    let api_routes = Router::new()
        .route("/users/me", get(handlers::users::get_me))
        .route(
            "/deposits",
            post(handlers::payments::create_deposit).get(handlers::payments::list_deposits),
        )
        .route("/games", get(handlers::games::list_games))
        .route("/games/{slug}", get(handlers::games::get_game))
        .route("/games/dice/play", post(handlers::games::play_dice))
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        // Webhook routes (called by the gateway, not part of the client API)
        .route("/webhooks/{provider}", post(handlers::payments::webhook_handler))
        .with_state(state.clone())
        .merge(auth_routes)
        .nest("/api/v1", api_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    // Create CORS layer from config
    let cors_layer = create_cors_layer(&state.config)?;
    let router = router.layer(cors_layer);

    // Add tracing layer
    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct that owns all resources and lifecycle.
///
/// 1. **Create**: [`Application::new`] connects to the database, runs
///    migrations, and seeds the admin account
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and handles
///    requests until the shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting parlor with configuration: {:#?}", config);

        let pool_settings = &config.database.pool;
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(pool_settings.max_connections)
            .min_connections(pool_settings.min_connections)
            .acquire_timeout(std::time::Duration::from_secs(pool_settings.acquire_timeout_secs))
            .idle_timeout(std::time::Duration::from_secs(pool_settings.idle_timeout_secs))
            .max_lifetime(std::time::Duration::from_secs(pool_settings.max_lifetime_secs))
            .connect(&config.database.url)
            .await?;

        migrator().run(&pool).await?;

        // Create initial admin user if it doesn't exist
        create_initial_admin_user(&config.admin_email, config.admin_password.as_deref(), &pool).await?;

        let app_state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let router = build_router(&app_state)?;

        Ok(Self { router, config, pool })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("Listening on {}", bind_addr);

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        info!("Server stopped, closing database pool");
        self.pool.close().await;

        Ok(())
    }
}
