//! Authentication and authorization.
//!
//! A session is a signed token stored in the user's token list. Authenticating a request
//! is always two steps: the token must verify (signature, expiry) and it must still be in
//! its owner's list, so logout takes effect immediately.

pub mod credentials;
pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppError;
use crate::state::AppState;

pub use credentials::CredentialStore;
pub use extractors::AuthenticatedUser;
pub use middleware::AuthMiddleware;
pub use token::{AuthError, Claims, TokenService};

/// Header carrying the session token, both in requests and in register/login responses.
pub const AUTH_HEADER: &str = "x-auth";

/// Payload for registration and login.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Credentials {
    /// Must be a valid email format.
    #[validate(email)]
    pub email: String,
    /// Must be at least 6 characters long.
    #[validate(length(min = 6))]
    pub password: String,
}

/// Resolves a raw token to the user holding it.
pub async fn authenticate(state: &AppState, raw_token: &str) -> Result<AuthenticatedUser, AppError> {
    let claims = state.tokens.verify(raw_token)?;

    let user = state
        .credentials
        .find_by_token(claims.sub, raw_token, &claims.access)
        .await?
        .ok_or(AuthError::RevokedToken)?;

    Ok(AuthenticatedUser {
        user,
        token: raw_token.to_string(),
    })
}
