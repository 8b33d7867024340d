use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::db::{NewUser, UserRepository};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

fn require_fields(fields: &[(&str, &str)]) -> Result<(), AppError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::InvalidInput(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )))
    }
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let Json(req) = payload?;
    require_fields(&[("username", req.username.as_str()), ("password", req.password.as_str())])?;

    let valid =
        UserRepository::authenticate(&state.db, &state.credentials, &req.username, &req.password)
            .await?;

    if !valid {
        tracing::warn!("Rejected login for {}", req.username);
        return Err(AppError::InvalidCredentials);
    }

    UserRepository::update_login_timestamp(&state.db, &req.username).await?;
    let token = state.sessions.issue(&req.username)?;

    tracing::info!("User {} logged in", req.username);
    Ok(Json(TokenResponse { token }))
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let Json(new_user) = payload?;
    require_fields(&[
        ("username", new_user.username.as_str()),
        ("password", new_user.password.as_str()),
        ("first_name", new_user.first_name.as_str()),
        ("last_name", new_user.last_name.as_str()),
        ("phone", new_user.phone.as_str()),
    ])?;

    let user = UserRepository::register(&state.db, &state.credentials, new_user)
        .await
        .inspect_err(|e| {
            if let AppError::DuplicateIdentity(msg) = e {
                tracing::warn!("Registration rejected: {}", msg);
            }
        })?;

    let token = state.sessions.issue(&user.username)?;

    tracing::info!("User {} registered", user.username);
    Ok(Json(TokenResponse { token }))
}
