//! HTTP handlers for the game catalog and the dice game.

use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::json;

use crate::{
    AppState,
    api::models::{
        games::{DicePlayRequest, DicePlayResponse},
        users::CurrentUser,
    },
    db::{handlers::GameRounds, handlers::Users, models::games::GameRoundCreateDBRequest},
    errors::Error,
    games::{self, GameInfo, dice},
};

/// List all game pages
#[utoipa::path(
    get,
    path = "/games",
    tag = "games",
    responses(
        (status = 200, description = "Game catalog", body = [GameInfo]),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_games() -> Json<&'static [GameInfo]> {
    Json(games::CATALOG)
}

/// Get one game page descriptor
#[utoipa::path(
    get,
    path = "/games/{slug}",
    tag = "games",
    responses(
        (status = 200, description = "Game descriptor", body = GameInfo),
        (status = 404, description = "No such game"),
    )
)]
#[tracing::instrument(skip_all, fields(slug = %slug))]
pub async fn get_game(Path(slug): Path<String>) -> Result<Json<&'static GameInfo>, Error> {
    games::find(&slug).map(Json).ok_or_else(|| Error::NotFound {
        resource: "game".to_string(),
        id: slug,
    })
}

/// Play a round of dice.
///
/// The stake is validated against the configured limits, the roll is
/// resolved, and settlement (debit + payout + round log) happens in one
/// database transaction. A stake above the current balance leaves the
/// balance untouched.
#[utoipa::path(
    post,
    path = "/games/dice/play",
    request_body = DicePlayRequest,
    tag = "games",
    responses(
        (status = 200, description = "Round settled", body = DicePlayResponse),
        (status = 400, description = "Invalid bet"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Insufficient balance"),
    ),
    security(
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn play_dice(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<DicePlayRequest>,
) -> Result<Json<DicePlayResponse>, Error> {
    let limits = &state.config.games;
    if request.amount < limits.min_bet || request.amount > limits.max_bet {
        return Err(Error::BadRequest {
            message: format!("Bet must be between {} and {}", limits.min_bet, limits.max_bet),
        });
    }

    dice::validate_target(request.target, request.direction).map_err(|message| Error::BadRequest { message })?;

    let roll = dice::roll();
    let outcome = dice::resolve(request.amount, request.target, request.direction, roll);

    let round = GameRoundCreateDBRequest {
        user_id: user.id,
        game: "dice".to_string(),
        bet_amount: request.amount,
        payout: outcome.payout,
        detail: json!({
            "target": request.target,
            "direction": request.direction,
            "roll": outcome.roll,
            "win": outcome.win,
            "multiplier": outcome.multiplier,
        }),
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let settled = GameRounds::new(&mut conn).settle(&round).await?;
    let Some((_, balance)) = settled else {
        // Settlement refused the debit; report how short the player is
        let available = Users::new(&mut conn).get_balance(user.id).await?;
        return Err(Error::InsufficientBalance {
            required: request.amount,
            available,
        });
    };

    tracing::info!(
        "Dice round for user {}: bet {} roll {} -> payout {}",
        user.id,
        request.amount,
        roll,
        outcome.payout
    );

    Ok(Json(DicePlayResponse {
        roll: outcome.roll,
        target: request.target,
        direction: request.direction,
        win: outcome.win,
        multiplier: outcome.multiplier,
        bet: request.amount,
        payout: outcome.payout,
        balance,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{session_cookie_for, test_config, test_state_with_config, test_user};
    use axum_test::TestServer;
    use rust_decimal::Decimal;

    fn games_router(state: AppState) -> axum::Router {
        axum::Router::new()
            .route("/games", axum::routing::get(list_games))
            .route("/games/{slug}", axum::routing::get(get_game))
            .route("/games/dice/play", axum::routing::post(play_dice))
            .with_state(state)
    }

    #[tokio::test]
    async fn test_list_games() {
        let server = TestServer::new(games_router(test_state_with_config(test_config()))).unwrap();

        let response = server.get("/games").await;
        response.assert_status_ok();
        let value: serde_json::Value = response.json();
        assert_eq!(value.as_array().unwrap().len(), games::CATALOG.len());
    }

    #[tokio::test]
    async fn test_get_game() {
        let server = TestServer::new(games_router(test_state_with_config(test_config()))).unwrap();

        let response = server.get("/games/dice").await;
        response.assert_status_ok();
        let value: serde_json::Value = response.json();
        assert_eq!(value["slug"], "dice");
        assert_eq!(value["playable"], true);

        let response = server.get("/games/baccarat").await;
        response.assert_status(axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_play_requires_session() {
        let server = TestServer::new(games_router(test_state_with_config(test_config()))).unwrap();

        let response = server
            .post("/games/dice/play")
            .json(&serde_json::json!({ "amount": 10, "target": 50, "direction": "over" }))
            .await;
        response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_play_rejects_bets_outside_limits() {
        let mut config = test_config();
        config.games.min_bet = Decimal::from(5);
        config.games.max_bet = Decimal::from(100);
        let cookie = session_cookie_for(&test_user(), &config);
        let server = TestServer::new(games_router(test_state_with_config(config))).unwrap();

        for amount in [0, 1, 101] {
            let response = server
                .post("/games/dice/play")
                .add_header("cookie", cookie.as_str())
                .json(&serde_json::json!({ "amount": amount, "target": 50, "direction": "over" }))
                .await;
            response.assert_status(axum::http::StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_play_rejects_invalid_targets() {
        let config = test_config();
        let cookie = session_cookie_for(&test_user(), &config);
        let server = TestServer::new(games_router(test_state_with_config(config))).unwrap();

        // Over 100 leaves no winning numbers; under 0 likewise
        for (target, direction) in [(100, "over"), (0, "under"), (0, "over")] {
            let response = server
                .post("/games/dice/play")
                .add_header("cookie", cookie.as_str())
                .json(&serde_json::json!({ "amount": 10, "target": target, "direction": direction }))
                .await;
            response.assert_status(axum::http::StatusCode::BAD_REQUEST);
        }
    }
}
