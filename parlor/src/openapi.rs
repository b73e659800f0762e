//! OpenAPI documentation assembly.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

use crate::api::{handlers, models};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "parlor",
        description = "A small casino platform: accounts, gateway deposits, and house games."
    ),
    paths(
        handlers::auth::get_registration_info,
        handlers::auth::register,
        handlers::auth::get_login_info,
        handlers::auth::login,
        handlers::auth::logout,
        handlers::users::get_me,
        handlers::payments::create_deposit,
        handlers::payments::list_deposits,
        handlers::payments::webhook_handler,
        handlers::games::list_games,
        handlers::games::get_game,
        handlers::games::play_dice,
    ),
    components(schemas(
        models::auth::RegistrationInfo,
        models::auth::LoginInfo,
        models::auth::RegisterRequest,
        models::auth::LoginRequest,
        models::auth::AuthResponse,
        models::auth::AuthSuccessResponse,
        models::users::UserResponse,
        models::payments::DepositCreateRequest,
        models::payments::CheckoutResponse,
        models::payments::DepositResponse,
        models::games::DicePlayRequest,
        models::games::DicePlayResponse,
        crate::db::models::payments::PaymentStatus,
        crate::games::GameInfo,
        crate::games::dice::RollDirection,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "authentication", description = "Registration, login, and logout"),
        (name = "users", description = "Account profile and balance"),
        (name = "payments", description = "Deposits and gateway webhooks"),
        (name = "games", description = "Game catalog and dice"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "CookieAuth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("parlor_session"))),
            );
        }
    }
}
