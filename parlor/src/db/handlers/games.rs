//! Database repository for game rounds and bet settlement.

use crate::db::{
    errors::Result,
    models::games::{GameRoundCreateDBRequest, GameRoundDBResponse},
};
use crate::types::{UserId, abbrev_uuid};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Connection, FromRow, PgConnection};
use tracing::instrument;

// Database entity model for a recorded round
#[derive(Debug, Clone, FromRow)]
struct GameRound {
    pub id: i64,
    pub user_id: UserId,
    pub game: String,
    pub bet_amount: Decimal,
    pub payout: Decimal,
    pub detail: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<GameRound> for GameRoundDBResponse {
    fn from(round: GameRound) -> Self {
        Self {
            id: round.id,
            user_id: round.user_id,
            game: round.game,
            bet_amount: round.bet_amount,
            payout: round.payout,
            detail: round.detail,
            created_at: round.created_at,
        }
    }
}

pub struct GameRounds<'c> {
    db: &'c mut PgConnection,
}

impl<'c> GameRounds<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Settle a round: debit the bet, credit the payout, and append to the
    /// round log, all in one transaction.
    ///
    /// The balance update carries its own sufficiency guard (`balance >= bet`
    /// in the WHERE clause), so a bet exceeding the current balance returns
    /// `None` without mutating anything.
    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id), game = %request.game), err)]
    pub async fn settle(&mut self, request: &GameRoundCreateDBRequest) -> Result<Option<(GameRoundDBResponse, Decimal)>> {
        let mut tx = self.db.begin().await?;

        let balance: Option<Decimal> = sqlx::query_scalar(
            r#"
            UPDATE users
            SET balance = balance - $1 + $2, updated_at = NOW()
            WHERE id = $3 AND balance >= $1
            RETURNING balance
            "#,
        )
        .bind(request.bet_amount)
        .bind(request.payout)
        .bind(request.user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(balance) = balance else {
            // Insufficient balance (or unknown user): roll back, no mutation
            return Ok(None);
        };

        let round = sqlx::query_as::<_, GameRound>(
            r#"
            INSERT INTO game_rounds (user_id, game, bet_amount, payout, detail)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, game, bet_amount, payout, detail, created_at
            "#,
        )
        .bind(request.user_id)
        .bind(&request.game)
        .bind(request.bet_amount)
        .bind(request.payout)
        .bind(&request.detail)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some((GameRoundDBResponse::from(round), balance)))
    }

    /// List a user's recent rounds, newest first
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), limit = limit, skip = skip), err)]
    pub async fn list_for_user(&mut self, user_id: UserId, skip: i64, limit: i64) -> Result<Vec<GameRoundDBResponse>> {
        let rounds = sqlx::query_as::<_, GameRound>(
            r#"
            SELECT id, user_id, game, bet_amount, payout, detail, created_at
            FROM game_rounds
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            OFFSET $2
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(skip)
        .bind(limit)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rounds.into_iter().map(GameRoundDBResponse::from).collect())
    }
}
