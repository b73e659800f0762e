//! API request/response models for games.

use crate::games::dice::RollDirection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request to play a dice round
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DicePlayRequest {
    /// Stake; must be within the configured bet limits
    #[schema(value_type = f64)]
    pub amount: Decimal,
    /// Target number (0..=100)
    pub target: u8,
    /// Whether the roll must land over or under the target
    pub direction: RollDirection,
}

/// Result of a settled dice round
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DicePlayResponse {
    /// The rolled number
    pub roll: u8,
    pub target: u8,
    pub direction: RollDirection,
    pub win: bool,
    /// Payout multiplier applied on a win
    #[schema(value_type = String)]
    pub multiplier: Decimal,
    #[schema(value_type = String)]
    pub bet: Decimal,
    /// Amount credited back (zero on a loss)
    #[schema(value_type = String)]
    pub payout: Decimal,
    /// Balance after settlement
    #[schema(value_type = String)]
    pub balance: Decimal,
}
