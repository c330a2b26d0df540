//! In-memory storage for development and testing.
//!
//! Each operation takes a single lock, which gives the same per-document atomicity
//! the database backend provides.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{TodoStore, UserStore};
use crate::error::AppError;
use crate::models::{NewUser, Todo, TodoPatch, Token, User};

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    /// Kept in insertion order.
    todos: RwLock<Vec<Todo>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == new_user.email) {
            return Err(AppError::Conflict("Email already registered".into()));
        }
        if users.contains_key(&new_user.id) {
            return Err(AppError::Conflict("User already exists".into()));
        }
        if new_user
            .tokens
            .iter()
            .any(|token| holds_token(&users, &token.token))
        {
            return Err(AppError::Conflict("Duplicate token".into()));
        }

        let user = User {
            id: new_user.id,
            email: new_user.email,
            password_hash: new_user.password_hash,
            tokens: new_user.tokens,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_user_by_token(
        &self,
        id: Uuid,
        token: &str,
        access: &str,
    ) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users
            .get(&id)
            .filter(|u| u.has_token(token, access))
            .cloned())
    }

    async fn push_token(&self, user_id: Uuid, token: Token) -> Result<(), AppError> {
        let mut users = self.users.write().await;
        if holds_token(&users, &token.token) {
            return Err(AppError::Conflict("Duplicate token".into()));
        }

        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        user.tokens.push(token);
        Ok(())
    }

    async fn pull_token(&self, user_id: Uuid, token: &str) -> Result<(), AppError> {
        if let Some(user) = self.users.write().await.get_mut(&user_id) {
            user.tokens.retain(|t| t.token != token);
        }
        Ok(())
    }
}

fn holds_token(users: &HashMap<Uuid, User>, token: &str) -> bool {
    users
        .values()
        .any(|u| u.tokens.iter().any(|t| t.token == token))
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn insert_todo(&self, todo: Todo) -> Result<Todo, AppError> {
        self.todos.write().await.push(todo.clone());
        Ok(todo)
    }

    async fn list_todos(&self, owner: Uuid) -> Result<Vec<Todo>, AppError> {
        let todos = self.todos.read().await;
        Ok(todos.iter().filter(|t| t.owner == owner).cloned().collect())
    }

    async fn find_todo(&self, id: Uuid, owner: Uuid) -> Result<Option<Todo>, AppError> {
        let todos = self.todos.read().await;
        Ok(todos
            .iter()
            .find(|t| t.id == id && t.owner == owner)
            .cloned())
    }

    async fn update_todo(
        &self,
        id: Uuid,
        owner: Uuid,
        patch: TodoPatch,
        now_ms: i64,
    ) -> Result<Option<Todo>, AppError> {
        let mut todos = self.todos.write().await;
        Ok(todos
            .iter_mut()
            .find(|t| t.id == id && t.owner == owner)
            .map(|todo| {
                todo.apply(patch, now_ms);
                todo.clone()
            }))
    }

    async fn delete_todo(&self, id: Uuid, owner: Uuid) -> Result<Option<Todo>, AppError> {
        let mut todos = self.todos.write().await;
        Ok(todos
            .iter()
            .position(|t| t.id == id && t.owner == owner)
            .map(|index| todos.remove(index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TodoInput, AUTH_ACCESS};

    fn new_user(email: &str) -> NewUser {
        NewUser::new(email.to_string(), "hash".to_string())
    }

    fn token(value: &str) -> Token {
        Token {
            access: AUTH_ACCESS.to_string(),
            token: value.to_string(),
        }
    }

    #[actix_rt::test]
    async fn test_duplicate_email_is_rejected() {
        let store = MemoryStore::new();
        store.insert_user(new_user("a@example.com")).await.unwrap();

        let err = store.insert_user(new_user("a@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.users.read().await.len(), 1);
    }

    #[actix_rt::test]
    async fn test_token_push_and_pull() {
        let store = MemoryStore::new();
        let user = store.insert_user(new_user("a@example.com")).await.unwrap();

        store.push_token(user.id, token("t1")).await.unwrap();
        store.push_token(user.id, token("t2")).await.unwrap();
        assert!(store
            .find_user_by_token(user.id, "t2", AUTH_ACCESS)
            .await
            .unwrap()
            .is_some());

        store.pull_token(user.id, "t1").await.unwrap();
        store.pull_token(user.id, "t1").await.unwrap();
        let user = store.find_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(user.tokens, vec![token("t2")]);
    }

    #[actix_rt::test]
    async fn test_token_strings_are_globally_unique() {
        let store = MemoryStore::new();
        let a = store.insert_user(new_user("a@example.com")).await.unwrap();
        let b = store.insert_user(new_user("b@example.com")).await.unwrap();

        store.push_token(a.id, token("shared")).await.unwrap();
        let err = store.push_token(b.id, token("shared")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[actix_rt::test]
    async fn test_insert_user_with_initial_token() {
        let store = MemoryStore::new();
        let mut alice = new_user("a@example.com");
        alice.tokens.push(token("first"));
        let alice = store.insert_user(alice).await.unwrap();
        assert_eq!(alice.tokens, vec![token("first")]);
        assert!(store
            .find_user_by_token(alice.id, "first", AUTH_ACCESS)
            .await
            .unwrap()
            .is_some());

        // A token clash rejects the whole account.
        let mut bob = new_user("b@example.com");
        bob.tokens.push(token("first"));
        let bob_id = bob.id;
        let err = store.insert_user(bob).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(store.find_user_by_id(bob_id).await.unwrap().is_none());
        assert!(store
            .find_user_by_email("b@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[actix_rt::test]
    async fn test_todos_are_scoped_to_owner() {
        let store = MemoryStore::new();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let todo = store
            .insert_todo(Todo::new(
                TodoInput {
                    text: "alice's".to_string(),
                },
                alice,
            ))
            .await
            .unwrap();

        assert!(store.find_todo(todo.id, bob).await.unwrap().is_none());
        assert!(store.list_todos(bob).await.unwrap().is_empty());
        assert!(store
            .update_todo(todo.id, bob, TodoPatch::default(), 0)
            .await
            .unwrap()
            .is_none());
        assert!(store.delete_todo(todo.id, bob).await.unwrap().is_none());

        assert_eq!(store.list_todos(alice).await.unwrap(), vec![todo.clone()]);
        assert_eq!(store.delete_todo(todo.id, alice).await.unwrap(), Some(todo));
        assert!(store.list_todos(alice).await.unwrap().is_empty());
    }
}
