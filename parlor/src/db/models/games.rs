//! Database models for the game round log.

use crate::types::UserId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Database request for appending a settled round
#[derive(Debug, Clone)]
pub struct GameRoundCreateDBRequest {
    pub user_id: UserId,
    pub game: String,
    pub bet_amount: Decimal,
    pub payout: Decimal,
    /// Bet parameters and outcome, as reported back to the player
    pub detail: serde_json::Value,
}

/// Database response for a recorded round
#[derive(Debug, Clone)]
pub struct GameRoundDBResponse {
    pub id: i64,
    pub user_id: UserId,
    pub game: String,
    pub bet_amount: Decimal,
    pub payout: Decimal,
    pub detail: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
