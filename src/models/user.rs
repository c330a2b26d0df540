use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Access scope carried by every session token.
pub const AUTH_ACCESS: &str = "auth";

/// A session token held by a user. A user may hold several at once (one per login).
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Token {
    pub access: String,
    pub token: String,
}

/// A registered account as held by the store.
///
/// The password is only ever kept as a bcrypt hash, and the struct is deliberately not
/// `Serialize`; use `UserResponse` for anything sent to a client.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    /// Active tokens, oldest first.
    pub tokens: Vec<Token>,
}

impl User {
    pub fn has_token(&self, token: &str, access: &str) -> bool {
        self.tokens
            .iter()
            .any(|t| t.token == token && t.access == access)
    }
}

/// A validated, hashed account ready to be persisted.
///
/// The id is chosen up front so session tokens can be issued for the account before it
/// is stored; `tokens` are persisted together with the user or not at all.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub tokens: Vec<Token>,
}

impl NewUser {
    pub fn new(email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash,
            tokens: Vec::new(),
        }
    }
}

/// Public view of a user.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub email: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
        }
    }
}

/// Canonical form used for storing and looking up emails.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_tokens(tokens: Vec<Token>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            password_hash: "$2b$04$hash".to_string(),
            tokens,
        }
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Test@Example.COM "), "test@example.com");
    }

    #[test]
    fn test_has_token_checks_access() {
        let user = user_with_tokens(vec![Token {
            access: AUTH_ACCESS.to_string(),
            token: "abc".to_string(),
        }]);

        assert!(user.has_token("abc", AUTH_ACCESS));
        assert!(!user.has_token("abc", "admin"));
        assert!(!user.has_token("abd", AUTH_ACCESS));
    }

    #[test]
    fn test_user_response_hides_secrets() {
        let user = user_with_tokens(vec![Token {
            access: AUTH_ACCESS.to_string(),
            token: "abc".to_string(),
        }]);
        let json = serde_json::to_value(UserResponse::from(&user)).unwrap();

        assert_eq!(json["_id"], user.id.to_string());
        assert_eq!(json["email"], "test@example.com");
        assert_eq!(json.as_object().unwrap().len(), 2);
    }
}
