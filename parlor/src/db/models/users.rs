//! Database models for users.

use crate::types::UserId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Database request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub password_hash: Option<String>,
    pub starting_balance: Decimal,
}

/// Database response for a user
#[derive(Debug, Clone)]
pub struct UserDBResponse {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub balance: Decimal,
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
