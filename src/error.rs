/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body `{ error, message }`)
 * - AuthError / RepoError / extractor rejection を統一的に変換
 *
 * Notes
 * - 認証失敗は missing / invalid / expired を区別しない (同じ 401 + 同じ message)
 * - 認可以外の失敗 (DB 障害など) を 401/403 に読み替えない
 */
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::authz::{AuthError, Operation};
use crate::repos::error::RepoError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {resource}")]
    NotFound { resource: &'static str },
    #[error("conflict: {0}")]
    Conflict(&'static str),
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Auth(AuthError::MissingToken)
            | AppError::Auth(AuthError::InvalidToken)
            | AppError::Auth(AuthError::Unauthenticated) => StatusCode::UNAUTHORIZED,
            AppError::Auth(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn auth_message(e: AuthError) -> &'static str {
    match e {
        AuthError::MissingToken | AuthError::InvalidToken => "Invalid or expired token",
        AuthError::Unauthenticated => "Authentication required",
        AuthError::InsufficientRole => "Insufficient permissions",
        AuthError::OwnershipDenied(Operation::Update) => {
            "You can only update your own information"
        }
        AuthError::OwnershipDenied(Operation::Delete) => "You can only delete your own account",
        AuthError::RoleEscalationDenied => "Only administrators can change user roles",
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error, message) = match self {
            AppError::Auth(e) => {
                let label = if status == StatusCode::UNAUTHORIZED {
                    "Unauthorized"
                } else {
                    "Forbidden"
                };
                (label, auth_message(e).to_string())
            }
            AppError::Validation(message) => ("Validation error", message),
            AppError::NotFound { resource } => ("Not Found", format!("{resource} not found")),
            AppError::Conflict(message) => ("Conflict", message.to_string()),
            AppError::Internal => ("Internal Server Error", "internal server error".into()),
        };

        (status, Json(ErrorResponse { error, message })).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound => AppError::not_found("User"),
            RepoError::Conflict => AppError::Conflict("Email already exists"),
            RepoError::Db(err) => {
                tracing::error!(error = %err, "user store failure");
                AppError::Internal
            }
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(e: PathRejection) -> Self {
        AppError::validation(e.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::validation(e.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(res: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn token_failures_share_one_response() {
        let missing = AppError::from(AuthError::MissingToken).into_response();
        let invalid = AppError::from(AuthError::InvalidToken).into_response();

        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(invalid.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(missing).await, body_json(invalid).await);
    }

    #[tokio::test]
    async fn authorization_denials_are_forbidden_with_reason() {
        let res = AppError::from(AuthError::RoleEscalationDenied).into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        let body = body_json(res).await;
        assert_eq!(body["error"], "Forbidden");
        assert_eq!(body["message"], "Only administrators can change user roles");
    }

    #[test]
    fn repo_errors_are_not_reinterpreted_as_auth() {
        assert_eq!(AppError::from(RepoError::NotFound).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::from(RepoError::Conflict).status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::from(RepoError::Db(sqlx::Error::PoolTimedOut)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
