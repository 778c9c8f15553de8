/*
 * Responsibility
 * - /users 系 handler (list / get / update / delete)
 * - Path/Json を受けて形式チェック → UsersService 呼び出し
 * - identity は CurrentPrincipal のみ。認可判断は service (ownership policy) 側
 */
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};

use crate::{
    api::v1::dto::users::{
        MessageResponse, UpdateUserRequest, UserEnvelope, UserListResponse, UserResponse,
        validate_user_id,
    },
    api::v1::extractors::CurrentPrincipal,
    authz::UserId,
    error::AppError,
    state::AppState,
};

fn user_id(path: Result<Path<UserId>, PathRejection>) -> Result<UserId, AppError> {
    let Path(id) = path?;
    validate_user_id(id).map_err(AppError::validation)
}

pub async fn list_users(State(state): State<AppState>) -> Result<Json<UserListResponse>, AppError> {
    tracing::info!("getting users");

    let users: Vec<UserResponse> = state
        .users
        .list()
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(Json(UserListResponse {
        message: "Successfully retrieved users",
        count: users.len(),
        users,
    }))
}

pub async fn get_user(
    State(state): State<AppState>,
    path: Result<Path<UserId>, PathRejection>,
) -> Result<Json<UserEnvelope>, AppError> {
    let id = user_id(path)?;
    tracing::info!(target_id = id, "getting user by id");

    let user = state.users.get(id).await?;

    Ok(Json(UserEnvelope {
        message: "Successfully retrieved user",
        user: user.into(),
    }))
}

pub async fn update_user(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    path: Result<Path<UserId>, PathRejection>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<UserEnvelope>, AppError> {
    let id = user_id(path)?;
    let Json(req) = body?;
    let changes = req.validate().map_err(AppError::validation)?;

    let user = state.users.update(&principal, id, changes).await?;

    Ok(Json(UserEnvelope {
        message: "User updated successfully",
        user: user.into(),
    }))
}

pub async fn delete_user(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    path: Result<Path<UserId>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = user_id(path)?;

    state.users.delete(&principal, id).await?;

    Ok(Json(MessageResponse {
        message: "User deleted successfully",
    }))
}
