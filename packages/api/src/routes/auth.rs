//! Register, login, current user and password change.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::{AppState, JsonBody};
use crate::auth::Identity;
use crate::error::ApiError;
use crate::models::{AuthResponse, MessageResponse, UserInfo};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

fn auth_response(state: &AppState, user: &store::User) -> Result<AuthResponse, ApiError> {
    let token = state.tokens.issue(user.id, &user.email)?;
    Ok(AuthResponse {
        user: UserInfo::from(user),
        token,
    })
}

pub async fn register(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let user = state
        .credentials
        .register(&body.name, &body.email, &body.password)
        .await?;
    Ok((StatusCode::CREATED, Json(auth_response(&state, &user)?)))
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = state.credentials.verify(&body.email, &body.password).await?;
    Ok(Json(auth_response(&state, &user)?))
}

pub async fn me(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<UserInfo>, ApiError> {
    let user = state
        .credentials
        .find_user(identity.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(Json(UserInfo::from(&user)))
}

pub async fn change_password(
    State(state): State<AppState>,
    identity: Identity,
    JsonBody(body): JsonBody<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .credentials
        .change_password(identity.id, &body.current_password, &body.new_password)
        .await?;
    Ok(Json(MessageResponse::new("Password updated")))
}
