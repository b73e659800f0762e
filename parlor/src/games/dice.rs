//! Dice game math and round resolution.
//!
//! A round rolls 0..=100 against a player-chosen target. "Over" wins when the
//! roll is strictly above the target, "Under" when strictly below. An exact
//! hit on the target always loses, which is where the house edge comes from:
//! the multiplier `100 / winning_numbers` is otherwise fair.

use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Highest rollable number (rolls are uniform over 0..=MAX_NUMBER)
pub const MAX_NUMBER: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RollDirection {
    Over,
    Under,
}

/// Outcome of a resolved dice round
#[derive(Debug, Clone)]
pub struct DiceOutcome {
    pub roll: u8,
    pub win: bool,
    pub multiplier: Decimal,
    pub payout: Decimal,
}

/// Validate the target number for its direction.
///
/// Over needs at least one winning number above the target, Under at least
/// one below, and the roll range is 0..=100.
pub fn validate_target(target: u8, direction: RollDirection) -> Result<(), String> {
    match direction {
        RollDirection::Over => {
            if target >= MAX_NUMBER {
                return Err(format!("Target must be less than {MAX_NUMBER} for over rolls"));
            }
            if target < 1 {
                return Err("Target must be at least 1 for over rolls".to_string());
            }
        }
        RollDirection::Under => {
            if target == 0 {
                return Err("Target must be greater than 0 for under rolls".to_string());
            }
            if target > MAX_NUMBER {
                return Err(format!("Target must be at most {MAX_NUMBER} for under rolls"));
            }
        }
    }
    Ok(())
}

/// Probability of winning for a target/direction pair
pub fn win_chance(target: u8, direction: RollDirection) -> f64 {
    let winning_numbers = match direction {
        // Winning outcomes: (target + 1) ..= MAX_NUMBER
        RollDirection::Over => (MAX_NUMBER - target) as f64,
        // Winning outcomes: 0 ..= (target - 1)
        RollDirection::Under => target as f64,
    };
    winning_numbers / (MAX_NUMBER as f64 + 1.0)
}

/// Payout multiplier for a target/direction pair.
///
/// `100 / winning_numbers` gives clean round multipliers (2x, 4x, 10x, ...);
/// the exact-hit loss supplies the house edge.
pub fn payout_multiplier(target: u8, direction: RollDirection) -> Decimal {
    let winning_numbers = match direction {
        RollDirection::Over => 100 - target as i64,
        RollDirection::Under => target as i64,
    };
    if winning_numbers == 0 {
        // Unreachable after validate_target, but never divide by zero
        return Decimal::ZERO;
    }
    Decimal::from(100) / Decimal::from(winning_numbers)
}

/// Roll the dice
pub fn roll() -> u8 {
    rand::rng().random_range(0..=MAX_NUMBER)
}

/// Resolve a round for a known roll.
///
/// Deterministic given the roll, so settlement math is testable without
/// touching the RNG.
pub fn resolve(bet_amount: Decimal, target: u8, direction: RollDirection, roll: u8) -> DiceOutcome {
    // House wins on exact target match
    let win = if roll == target {
        false
    } else {
        match direction {
            RollDirection::Over => roll > target,
            RollDirection::Under => roll < target,
        }
    };

    let multiplier = payout_multiplier(target, direction);
    let payout = if win {
        (bet_amount * multiplier).round_dp(2)
    } else {
        Decimal::ZERO
    };

    DiceOutcome {
        roll,
        win,
        multiplier,
        payout,
    }
}
