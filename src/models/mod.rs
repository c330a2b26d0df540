pub mod todo;
pub mod user;

pub use todo::{Todo, TodoEnvelope, TodoInput, TodoList, TodoPatch};
pub use user::{normalize_email, NewUser, Token, User, UserResponse, AUTH_ACCESS};
