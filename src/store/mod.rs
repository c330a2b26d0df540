//! Storage interfaces for users and todos.
//!
//! Handlers never talk to a database directly; they go through these traits so the
//! backend can be swapped (PostgreSQL in production, memory for development and tests).
//! Every todo operation takes the owner's id and must never return or touch a todo
//! belonging to anyone else.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{NewUser, Todo, TodoPatch, Token, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Persistence of user accounts and their session tokens.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persists a new user along with its initial tokens, all or nothing.
    ///
    /// Fails with `AppError::Conflict` if the email is taken or any of the tokens is
    /// already held by someone.
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Returns the user only if `token` is currently in their token list with `access`.
    async fn find_user_by_token(
        &self,
        id: Uuid,
        token: &str,
        access: &str,
    ) -> Result<Option<User>, AppError>;

    /// Appends a token. Fails with `AppError::Conflict` if any user already holds it.
    async fn push_token(&self, user_id: Uuid, token: Token) -> Result<(), AppError>;

    /// Removes a token. Removing a token that is not there is not an error.
    async fn pull_token(&self, user_id: Uuid, token: &str) -> Result<(), AppError>;
}

/// Owner-scoped persistence of todos.
#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn insert_todo(&self, todo: Todo) -> Result<Todo, AppError>;

    /// All todos of `owner`, oldest first.
    async fn list_todos(&self, owner: Uuid) -> Result<Vec<Todo>, AppError>;

    async fn find_todo(&self, id: Uuid, owner: Uuid) -> Result<Option<Todo>, AppError>;

    /// Applies `patch` atomically. `now_ms` is used if the todo becomes completed.
    async fn update_todo(
        &self,
        id: Uuid,
        owner: Uuid,
        patch: TodoPatch,
        now_ms: i64,
    ) -> Result<Option<Todo>, AppError>;

    /// Deletes and returns the todo, or `None` if `owner` has no such todo.
    async fn delete_todo(&self, id: Uuid, owner: Uuid) -> Result<Option<Todo>, AppError>;
}
