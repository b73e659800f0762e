//! Shared helpers for route-level tests.
//!
//! Tests here never reach a live database: the pool is created lazily and the
//! handlers under test fail or finish before any connection is needed.

use crate::{AppState, api::models::users::CurrentUser, auth::session, config::Config};
use sqlx::PgPool;
use uuid::Uuid;

/// Config with the knobs tests need: a JWT secret and auth enabled.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.secret_key = Some("test-secret-key-for-jwt".to_string());
    config.auth.native.enabled = true;
    config.auth.native.allow_registration = true;
    config
}

/// App state over a lazy pool; no database is contacted until a query runs.
pub fn test_state_with_config(config: Config) -> AppState {
    let db = PgPool::connect_lazy("postgresql://postgres@localhost:5432/parlor_test").expect("lazy pool");
    AppState::builder().db(db).config(config).build()
}

pub fn test_user() -> CurrentUser {
    CurrentUser {
        id: Uuid::new_v4(),
        username: "player".to_string(),
        email: "player@example.com".to_string(),
        is_admin: false,
    }
}

/// A valid session cookie header value for `user`
pub fn session_cookie_for(user: &CurrentUser, config: &Config) -> String {
    let token = session::create_session_token(user, config).expect("session token");
    format!("{}={}", config.auth.native.session.cookie_name, token)
}
