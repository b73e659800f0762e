use axum::{Json, extract::State};

use crate::{
    AppState,
    api::models::users::{CurrentUser, UserResponse},
    db::handlers::Users,
    errors::Error,
};

/// Get the authenticated user's profile and balance
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "users",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_me(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<UserResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);

    // The session may outlive the account row
    let user = user_repo.get_by_id(current_user.id).await?.ok_or_else(|| Error::Unauthenticated {
        message: Some("User not found".to_string()),
    })?;

    Ok(Json(UserResponse::from(user)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{test_config, test_state_with_config};
    use axum_test::TestServer;

    #[tokio::test]
    async fn test_get_me_requires_session() {
        let router = axum::Router::new()
            .route("/users/me", axum::routing::get(get_me))
            .with_state(test_state_with_config(test_config()));
        let server = TestServer::new(router).unwrap();

        let response = server.get("/users/me").await;
        response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
    }
}
