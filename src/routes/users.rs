use crate::{
    auth::{AuthenticatedUser, Credentials, AUTH_HEADER},
    error::AppError,
    models::{Token, User, UserResponse, AUTH_ACCESS},
    state::AppState,
};
use actix_web::{delete, get, post, web, HttpResponse, Responder};

/// Register a new user
///
/// Creates the account, opens a first session and returns the user with the session
/// token in the `x-auth` header.
///
/// ## Responses:
/// - `200 OK`: `{ "_id", "email" }` plus the `x-auth` header.
/// - `400 Bad Request`: Malformed body, invalid email, short password or email already taken.
#[post("")]
pub async fn register(
    state: web::Data<AppState>,
    credentials: web::Json<Credentials>,
) -> Result<impl Responder, AppError> {
    let (user, token) = state
        .credentials
        .register(&credentials, &state.tokens)
        .await?;
    log::info!("Registered user {}", user.id);

    Ok(session_response(&user, token))
}

/// Login user
///
/// Verifies the credentials and opens an additional session. Existing sessions stay valid.
///
/// ## Responses:
/// - `200 OK`: `{ "_id", "email" }` plus a new token in the `x-auth` header.
/// - `400 Bad Request`: Malformed body, unknown email or wrong password.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    credentials: web::Json<Credentials>,
) -> Result<impl Responder, AppError> {
    let user = state
        .credentials
        .find_by_credentials(&credentials.email, &credentials.password)
        .await?;
    log::info!("User {} logged in", user.id);

    open_session(&state, &user).await
}

/// Returns the calling user.
#[get("")]
pub async fn me(identity: AuthenticatedUser) -> impl Responder {
    HttpResponse::Ok().json(UserResponse::from(&identity.user))
}

/// Logout: revokes the token the request was made with. Other sessions are untouched.
#[delete("/token")]
pub async fn logout(
    state: web::Data<AppState>,
    identity: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    state
        .credentials
        .remove_token(identity.user.id, &identity.token)
        .await?;
    log::info!("User {} logged out", identity.user.id);

    Ok(HttpResponse::Ok().finish())
}

async fn open_session(state: &AppState, user: &User) -> Result<HttpResponse, AppError> {
    let token = state.tokens.issue(user.id, AUTH_ACCESS)?;
    state.credentials.add_token(user.id, token.clone()).await?;

    Ok(session_response(user, token))
}

fn session_response(user: &User, token: Token) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((AUTH_HEADER, token.token))
        .json(UserResponse::from(user))
}
