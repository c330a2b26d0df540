//! PostgreSQL storage backed by `sqlx`.
//!
//! The schema lives in `migrations/` and is applied on connect. Token strings are the
//! primary key of `user_tokens`, which enforces their global uniqueness.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{TodoStore, UserStore};
use crate::error::AppError;
use crate::models::{NewUser, Todo, TodoPatch, Token, User};

const TODO_COLUMNS: &str = "id, text, completed, completed_at, owner_id";

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connects, then brings the schema up to date.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        let store = Self::from_pool(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn with_tokens(&self, row: UserRow) -> Result<User, AppError> {
        let tokens = sqlx::query_as::<_, Token>(
            "SELECT access, token FROM user_tokens WHERE user_id = $1 ORDER BY seq",
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            tokens,
        })
    }

    async fn load_user(&self, row: Option<UserRow>) -> Result<Option<User>, AppError> {
        match row {
            Some(row) => Ok(Some(self.with_tokens(row).await?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (id, email, password_hash) VALUES ($1, $2, $3)
             RETURNING id, email, password_hash",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict("Email already registered".into()),
            other => other,
        })?;

        for token in &user.tokens {
            sqlx::query("INSERT INTO user_tokens (user_id, access, token) VALUES ($1, $2, $3)")
                .bind(row.id)
                .bind(&token.access)
                .bind(&token.token)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            tokens: user.tokens,
        })
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        self.load_user(row).await
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        self.load_user(row).await
    }

    async fn find_user_by_token(
        &self,
        id: Uuid,
        token: &str,
        access: &str,
    ) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT u.id, u.email, u.password_hash
             FROM users u JOIN user_tokens t ON t.user_id = u.id
             WHERE u.id = $1 AND t.token = $2 AND t.access = $3",
        )
        .bind(id)
        .bind(token)
        .bind(access)
        .fetch_optional(&self.pool)
        .await?;
        self.load_user(row).await
    }

    async fn push_token(&self, user_id: Uuid, token: Token) -> Result<(), AppError> {
        sqlx::query("INSERT INTO user_tokens (user_id, access, token) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(&token.access)
            .bind(&token.token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn pull_token(&self, user_id: Uuid, token: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM user_tokens WHERE user_id = $1 AND token = $2")
            .bind(user_id)
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl TodoStore for PgStore {
    async fn insert_todo(&self, todo: Todo) -> Result<Todo, AppError> {
        let sql = format!(
            "INSERT INTO todos (id, text, completed, completed_at, owner_id)
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            TODO_COLUMNS
        );
        let todo = sqlx::query_as::<_, Todo>(&sql)
            .bind(todo.id)
            .bind(&todo.text)
            .bind(todo.completed)
            .bind(todo.completed_at)
            .bind(todo.owner)
            .fetch_one(&self.pool)
            .await?;
        Ok(todo)
    }

    async fn list_todos(&self, owner: Uuid) -> Result<Vec<Todo>, AppError> {
        let sql = format!(
            "SELECT {} FROM todos WHERE owner_id = $1 ORDER BY created_at, id",
            TODO_COLUMNS
        );
        let todos = sqlx::query_as::<_, Todo>(&sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;
        Ok(todos)
    }

    async fn find_todo(&self, id: Uuid, owner: Uuid) -> Result<Option<Todo>, AppError> {
        let sql = format!(
            "SELECT {} FROM todos WHERE id = $1 AND owner_id = $2",
            TODO_COLUMNS
        );
        let todo = sqlx::query_as::<_, Todo>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?;
        Ok(todo)
    }

    async fn update_todo(
        &self,
        id: Uuid,
        owner: Uuid,
        patch: TodoPatch,
        now_ms: i64,
    ) -> Result<Option<Todo>, AppError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "SELECT {} FROM todos WHERE id = $1 AND owner_id = $2 FOR UPDATE",
            TODO_COLUMNS
        );
        let current = sqlx::query_as::<_, Todo>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&mut *tx)
            .await?;

        let mut todo = match current {
            Some(todo) => todo,
            None => return Ok(None),
        };
        todo.apply(patch, now_ms);

        sqlx::query(
            "UPDATE todos SET text = $1, completed = $2, completed_at = $3
             WHERE id = $4 AND owner_id = $5",
        )
        .bind(&todo.text)
        .bind(todo.completed)
        .bind(todo.completed_at)
        .bind(id)
        .bind(owner)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(todo))
    }

    async fn delete_todo(&self, id: Uuid, owner: Uuid) -> Result<Option<Todo>, AppError> {
        let sql = format!(
            "DELETE FROM todos WHERE id = $1 AND owner_id = $2 RETURNING {}",
            TODO_COLUMNS
        );
        let todo = sqlx::query_as::<_, Todo>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?;
        Ok(todo)
    }
}
