use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{Todo, TodoEnvelope, TodoInput, TodoList, TodoPatch},
    state::AppState,
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

/// Lists the authenticated user's todos, oldest first.
///
/// ## Responses:
/// - `200 OK`: `{ "todos": [...] }`.
/// - `401 Unauthorized`: Missing or invalid token.
#[get("")]
pub async fn list_todos(
    state: web::Data<AppState>,
    identity: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let todos = state.todos.list_todos(identity.user.id).await?;
    Ok(HttpResponse::Ok().json(TodoList { todos }))
}

/// Creates a new todo owned by the authenticated user.
///
/// ## Request Body:
/// - `text`: required, must not be blank.
///
/// ## Responses:
/// - `200 OK`: The created todo.
/// - `400 Bad Request`: Missing or blank `text`, or a malformed body.
/// - `401 Unauthorized`: Missing or invalid token.
#[post("")]
pub async fn create_todo(
    state: web::Data<AppState>,
    identity: AuthenticatedUser,
    todo_data: web::Json<TodoInput>,
) -> Result<impl Responder, AppError> {
    let mut input = todo_data.into_inner();
    input.normalize();
    input.validate()?;

    let todo = state
        .todos
        .insert_todo(Todo::new(input, identity.user.id))
        .await?;

    Ok(HttpResponse::Ok().json(todo))
}

/// Retrieves one of the authenticated user's todos.
///
/// ## Responses:
/// - `200 OK`: `{ "todo": ... }`.
/// - `404 Not Found`: The id is malformed, unknown, or belongs to another user.
#[get("/{id}")]
pub async fn get_todo(
    state: web::Data<AppState>,
    identity: AuthenticatedUser,
    todo_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let id = parse_todo_id(&todo_id)?;

    let todo = state
        .todos
        .find_todo(id, identity.user.id)
        .await?
        .ok_or_else(todo_not_found)?;

    Ok(HttpResponse::Ok().json(TodoEnvelope { todo }))
}

/// Updates text and/or completion of one of the authenticated user's todos.
///
/// Setting `completed` to `true` stamps `completedAt`; setting it to `false` clears it.
///
/// The id is checked before the body is read, so a malformed id is a 404 whatever the
/// body holds.
///
/// ## Responses:
/// - `200 OK`: `{ "todo": ... }` with the updated todo.
/// - `400 Bad Request`: Blank `text` or a malformed body.
/// - `404 Not Found`: The id is malformed, unknown, or belongs to another user.
#[patch("/{id}")]
pub async fn update_todo(
    state: web::Data<AppState>,
    identity: AuthenticatedUser,
    todo_id: web::Path<String>,
    body: web::Bytes,
) -> Result<impl Responder, AppError> {
    let id = parse_todo_id(&todo_id)?;
    let mut patch = parse_patch(&body)?;
    patch.normalize();
    patch.validate()?;

    let todo = state
        .todos
        .update_todo(id, identity.user.id, patch, Utc::now().timestamp_millis())
        .await?
        .ok_or_else(todo_not_found)?;

    Ok(HttpResponse::Ok().json(TodoEnvelope { todo }))
}

/// Deletes one of the authenticated user's todos and returns it.
///
/// ## Responses:
/// - `200 OK`: `{ "todo": ... }` with the removed todo.
/// - `404 Not Found`: The id is malformed, unknown, or belongs to another user.
#[delete("/{id}")]
pub async fn delete_todo(
    state: web::Data<AppState>,
    identity: AuthenticatedUser,
    todo_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let id = parse_todo_id(&todo_id)?;

    let todo = state
        .todos
        .delete_todo(id, identity.user.id)
        .await?
        .ok_or_else(todo_not_found)?;

    Ok(HttpResponse::Ok().json(TodoEnvelope { todo }))
}

/// Malformed ids are reported exactly like unknown ones.
fn parse_todo_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| todo_not_found())
}

fn parse_patch(body: &[u8]) -> Result<TodoPatch, AppError> {
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("Invalid JSON: {}", e)))
}

fn todo_not_found() -> AppError {
    AppError::NotFound("Todo not found".into())
}
