//! User Account API Handlers

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use serde_json::json;

use crate::audit::{Actor, AuditAction};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{User, UserCreate, UserUpdate};
use crate::db::repository::UserRepository;
use crate::utils::{AppError, AppResult};

/// GET /api/users - 用户列表 (密码哈希不序列化)
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<User>>> {
    let repo = UserRepository::new(state.db.clone());
    let users = repo
        .find_all()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(Json(users))
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub message: String,
    pub user: User,
}

/// POST /api/users - 创建用户
pub async fn create(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<UserCreate>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let repo = UserRepository::new(state.db.clone());
    let username = payload.username.clone();
    let role = payload.role;
    let user = repo.create(payload).await?;

    state
        .audit_service
        .log(
            AuditAction::UserAdded,
            Actor::user(&current.id, &current.username),
            json!({ "username": username, "role": role }),
        )
        .await;

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            message: "User added successfully".to_string(),
            user,
        }),
    ))
}

/// PUT /api/users/:id - 更新用户 (提供密码时重新哈希)
pub async fn update(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<UserUpdate>,
) -> AppResult<Json<UserResponse>> {
    let repo = UserRepository::new(state.db.clone());
    let password_changed = payload.password.is_some();
    let user = repo.update(&id, payload).await?;

    state
        .audit_service
        .log(
            AuditAction::UserUpdated,
            Actor::user(&current.id, &current.username),
            json!({
                "userId": id,
                "username": &user.username,
                "passwordChanged": password_changed,
            }),
        )
        .await;

    Ok(Json(UserResponse {
        message: "User updated successfully".to_string(),
        user,
    }))
}

#[derive(Debug, Serialize)]
pub struct DeleteUserResponse {
    pub message: String,
}

/// DELETE /api/users/:id - 删除用户
pub async fn delete(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Json<DeleteUserResponse>> {
    let repo = UserRepository::new(state.db.clone());
    let deleted = repo.delete(&id).await?;

    state
        .audit_service
        .log(
            AuditAction::UserDeleted,
            Actor::user(&current.id, &current.username),
            json!({ "userId": id, "username": deleted.username }),
        )
        .await;

    Ok(Json(DeleteUserResponse {
        message: "User deleted successfully".to_string(),
    }))
}
