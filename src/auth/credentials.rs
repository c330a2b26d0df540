use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::{Credentials, TokenService};
use crate::error::AppError;
use crate::models::{normalize_email, NewUser, Token, User, AUTH_ACCESS};
use crate::store::UserStore;

/// User accounts and their active tokens, on top of a `UserStore`.
///
/// Owns the password policy: passwords are validated and hashed here, and the
/// plaintext never leaves this type.
#[derive(Clone)]
pub struct CredentialStore {
    users: Arc<dyn UserStore>,
    bcrypt_cost: u32,
}

impl CredentialStore {
    pub fn new(users: Arc<dyn UserStore>, bcrypt_cost: u32) -> Self {
        Self { users, bcrypt_cost }
    }

    /// Registers a new account without any session.
    ///
    /// Returns `ValidationError` for a malformed email or short password and `Conflict`
    /// if the (normalized) email is already registered.
    pub async fn create_user(&self, credentials: &Credentials) -> Result<User, AppError> {
        let new_user = self.prepare_user(credentials).await?;
        self.users.insert_user(new_user).await
    }

    /// Registers a new account and opens its first session in a single store write, so
    /// an account never exists without the token handed back to the client.
    pub async fn register(
        &self,
        credentials: &Credentials,
        tokens: &TokenService,
    ) -> Result<(User, Token), AppError> {
        let mut new_user = self.prepare_user(credentials).await?;
        let token = tokens.issue(new_user.id, AUTH_ACCESS)?;
        new_user.tokens.push(token.clone());

        let user = self.users.insert_user(new_user).await?;
        Ok((user, token))
    }

    async fn prepare_user(&self, credentials: &Credentials) -> Result<NewUser, AppError> {
        let credentials = Credentials {
            email: normalize_email(&credentials.email),
            password: credentials.password.clone(),
        };
        credentials.validate()?;

        if self
            .users
            .find_user_by_email(&credentials.email)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Email already registered".into()));
        }

        let password_hash = hash_password(&credentials.password, self.bcrypt_cost)?;
        Ok(NewUser::new(credentials.email, password_hash))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<User, AppError> {
        self.users
            .find_user_by_email(&normalize_email(email))
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<User, AppError> {
        self.users
            .find_user_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    pub async fn find_by_token(
        &self,
        id: Uuid,
        token: &str,
        access: &str,
    ) -> Result<Option<User>, AppError> {
        self.users.find_user_by_token(id, token, access).await
    }

    /// Looks a user up for login. An unknown email and a wrong password are reported
    /// identically.
    pub async fn find_by_credentials(&self, email: &str, password: &str) -> Result<User, AppError> {
        let user = match self.find_by_email(email).await {
            Ok(user) => user,
            Err(AppError::NotFound(_)) => return Err(invalid_credentials()),
            Err(e) => return Err(e),
        };

        if self.verify_password(&user, password)? {
            Ok(user)
        } else {
            Err(invalid_credentials())
        }
    }

    pub fn verify_password(&self, user: &User, candidate: &str) -> Result<bool, AppError> {
        verify_password(candidate, &user.password_hash)
    }

    pub async fn add_token(&self, user_id: Uuid, token: Token) -> Result<(), AppError> {
        self.users.push_token(user_id, token).await
    }

    /// Idempotent: removing an absent token succeeds.
    pub async fn remove_token(&self, user_id: Uuid, token: &str) -> Result<(), AppError> {
        self.users.pull_token(user_id, token).await
    }
}

fn invalid_credentials() -> AppError {
    AppError::BadRequest("Invalid credentials".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::Duration;

    fn store() -> CredentialStore {
        CredentialStore::new(Arc::new(MemoryStore::new()), 4)
    }

    fn credentials(email: &str, password: &str) -> Credentials {
        Credentials {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[actix_rt::test]
    async fn test_create_user_hashes_and_normalizes() {
        let store = store();
        let user = store
            .create_user(&credentials(" Example@Example.com", "qwerty1234"))
            .await
            .unwrap();

        assert_eq!(user.email, "example@example.com");
        assert_ne!(user.password_hash, "qwerty1234");
        assert!(store.verify_password(&user, "qwerty1234").unwrap());
        assert!(!store.verify_password(&user, "qwerty12345").unwrap());
        assert_eq!(
            store.find_by_email("EXAMPLE@example.com").await.unwrap().id,
            user.id
        );
    }

    #[actix_rt::test]
    async fn test_create_user_rejects_invalid_input() {
        let store = store();

        let err = store.create_user(&credentials("and", "123456")).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let err = store
            .create_user(&credentials("a@example.com", "12345"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[actix_rt::test]
    async fn test_create_user_rejects_duplicates() {
        let store = store();
        store
            .create_user(&credentials("a@example.com", "password1"))
            .await
            .unwrap();

        let err = store
            .create_user(&credentials("A@EXAMPLE.COM", "password2"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[actix_rt::test]
    async fn test_register_opens_first_session() {
        let store = store();
        let tokens = TokenService::new("credentials-secret", Duration::hours(1));

        let (user, token) = store
            .register(&credentials("New@Example.com", "password1"), &tokens)
            .await
            .unwrap();
        assert_eq!(user.email, "new@example.com");
        assert_eq!(user.tokens, vec![token.clone()]);
        assert_eq!(tokens.verify(&token.token).unwrap().sub, user.id);
        assert!(store
            .find_by_token(user.id, &token.token, AUTH_ACCESS)
            .await
            .unwrap()
            .is_some());

        // A rejected registration leaves nothing behind.
        let err = store
            .register(&credentials("new@example.com", "password2"), &tokens)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        let stored = store.find_by_email("new@example.com").await.unwrap();
        assert_eq!(stored.tokens, vec![token]);
    }

    #[actix_rt::test]
    async fn test_find_by_credentials() {
        let store = store();
        let user = store
            .create_user(&credentials("a@example.com", "password1"))
            .await
            .unwrap();

        let found = store
            .find_by_credentials("a@example.com", "password1")
            .await
            .unwrap();
        assert_eq!(found.id, user.id);

        let wrong_password = store
            .find_by_credentials("a@example.com", "password2")
            .await
            .unwrap_err();
        let unknown_email = store
            .find_by_credentials("b@example.com", "password1")
            .await
            .unwrap_err();
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert!(matches!(unknown_email, AppError::BadRequest(_)));
    }

    #[actix_rt::test]
    async fn test_token_lifecycle() {
        let store = store();
        let user = store
            .create_user(&credentials("a@example.com", "password1"))
            .await
            .unwrap();
        let token = Token {
            access: AUTH_ACCESS.to_string(),
            token: "session".to_string(),
        };

        store.add_token(user.id, token.clone()).await.unwrap();
        assert!(store
            .find_by_token(user.id, "session", AUTH_ACCESS)
            .await
            .unwrap()
            .is_some());

        store.remove_token(user.id, "session").await.unwrap();
        store.remove_token(user.id, "session").await.unwrap();
        assert!(store
            .find_by_token(user.id, "session", AUTH_ACCESS)
            .await
            .unwrap()
            .is_none());
        assert!(store.find_by_id(user.id).await.unwrap().tokens.is_empty());
    }
}
