#![doc = "The `todo_api` library crate."]
#![doc = ""]
#![doc = "Users register, log in with session tokens carried in the `x-auth` header, and manage"]
#![doc = "private todo lists. The binary (`main.rs`) loads configuration, builds the `AppState`"]
#![doc = "and mounts `routes::config`."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;

pub use error::AppError;
pub use state::AppState;
