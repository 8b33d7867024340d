use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;

use crate::api::middleware::CurrentUser;
use crate::api::state::AppState;
use crate::db::{MessageRepository, ReceivedMessage, SentMessage, UserProfile, UserRepository, UserSummary};
use crate::error::AppError;

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<UserSummary>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct MessagesResponse<T> {
    pub messages: Vec<T>,
}

fn ensure_correct_user(current: &CurrentUser, username: &str) -> Result<(), AppError> {
    if current.0 == username {
        Ok(())
    } else {
        tracing::warn!("{} tried to read messages of {}", current.0, username);
        Err(AppError::Unauthorized)
    }
}

/// GET /users (requires auth)
pub async fn list_users(State(state): State<AppState>) -> Result<Json<UsersResponse>, AppError> {
    let users = UserRepository::all(&state.db).await?;
    Ok(Json(UsersResponse { users }))
}

/// GET /users/:username (requires auth)
pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let user = UserRepository::get(&state.db, &username).await?;
    Ok(Json(UserResponse { user }))
}

/// GET /users/:username/from (requires auth as :username)
pub async fn messages_from(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(username): Path<String>,
) -> Result<Json<MessagesResponse<SentMessage>>, AppError> {
    ensure_correct_user(&current, &username)?;
    let messages = MessageRepository::messages_from(&state.db, &username).await?;
    Ok(Json(MessagesResponse { messages }))
}

/// GET /users/:username/to (requires auth as :username)
pub async fn messages_to(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(username): Path<String>,
) -> Result<Json<MessagesResponse<ReceivedMessage>>, AppError> {
    ensure_correct_user(&current, &username)?;
    let messages = MessageRepository::messages_to(&state.db, &username).await?;
    Ok(Json(MessagesResponse { messages }))
}
