use std::sync::Arc;

use chrono::Duration;

use crate::auth::{CredentialStore, TokenService};
use crate::config::Config;
use crate::error::AppError;
use crate::store::{MemoryStore, PgStore, TodoStore, UserStore};

/// Everything handlers need, injected through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub credentials: CredentialStore,
    pub tokens: TokenService,
    pub todos: Arc<dyn TodoStore>,
    /// Name of the storage backend, reported by the health check.
    pub backend: &'static str,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserStore>,
        todos: Arc<dyn TodoStore>,
        tokens: TokenService,
        bcrypt_cost: u32,
        backend: &'static str,
    ) -> Self {
        Self {
            credentials: CredentialStore::new(users, bcrypt_cost),
            tokens,
            todos,
            backend,
        }
    }

    pub fn in_memory(tokens: TokenService, bcrypt_cost: u32) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(store.clone(), store, tokens, bcrypt_cost, "memory")
    }

    /// Builds the state described by `config`, connecting to PostgreSQL when
    /// `DATABASE_URL` is set.
    pub async fn from_config(config: &Config) -> Result<Self, AppError> {
        let tokens = TokenService::new(&config.jwt_secret, Duration::hours(config.token_ttl_hours));

        match &config.database_url {
            Some(url) => {
                let store = Arc::new(PgStore::connect(url, config.database_max_connections).await?);
                log::info!("Using PostgreSQL store");
                Ok(Self::new(
                    store.clone(),
                    store,
                    tokens,
                    config.bcrypt_cost,
                    "postgres",
                ))
            }
            None => {
                log::warn!("DATABASE_URL not set, data will be kept in memory only");
                Ok(Self::in_memory(tokens, config.bcrypt_cost))
            }
        }
    }
}
