use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Input structure for creating a todo.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TodoInput {
    /// Must not be empty once surrounding whitespace is removed.
    #[validate(length(min = 1))]
    pub text: String,
}

impl TodoInput {
    pub fn normalize(&mut self) {
        self.text = self.text.trim().to_string();
    }
}

/// Partial update of a todo. Absent fields are left untouched.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct TodoPatch {
    #[validate(length(min = 1))]
    pub text: Option<String>,
    pub completed: Option<bool>,
}

impl TodoPatch {
    pub fn normalize(&mut self) {
        if let Some(text) = self.text.as_mut() {
            *text = text.trim().to_string();
        }
    }
}

/// A todo item as stored and returned by the API.
///
/// Field names on the wire are `_id`, `text`, `completed`, `completedAt` and `_creator`.
/// `completedAt` is epoch milliseconds and only present while the todo is completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Todo {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub text: String,
    pub completed: bool,
    #[serde(
        rename = "completedAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<i64>,
    /// Owning user. Never changes after creation.
    #[serde(rename = "_creator")]
    #[sqlx(rename = "owner_id")]
    pub owner: Uuid,
}

impl Todo {
    pub fn new(input: TodoInput, owner: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: input.text,
            completed: false,
            completed_at: None,
            owner,
        }
    }

    /// Applies a patch. `now_ms` is stamped only when the todo becomes completed;
    /// un-completing clears the timestamp.
    pub fn apply(&mut self, patch: TodoPatch, now_ms: i64) {
        if let Some(text) = patch.text {
            self.text = text;
        }
        match patch.completed {
            Some(true) if !self.completed => {
                self.completed = true;
                self.completed_at = Some(now_ms);
            }
            Some(false) => {
                self.completed = false;
                self.completed_at = None;
            }
            _ => {}
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TodoEnvelope {
    pub todo: Todo,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TodoList {
    pub todos: Vec<Todo>,
}
