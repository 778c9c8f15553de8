/*
 * Responsibility
 * - 認証/認可の失敗分類 (すべて request に対して terminal、retry しない)
 */
use thiserror::Error;

use crate::authz::policy::Operation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("no credential presented")]
    MissingToken,
    #[error("credential failed verification")]
    InvalidToken,
    #[error("no authenticated principal")]
    Unauthenticated,
    #[error("role not allowed for this route")]
    InsufficientRole,
    #[error("not the owner of the target and not an admin")]
    OwnershipDenied(Operation),
    #[error("role change requires admin")]
    RoleEscalationDenied,
}

impl AuthError {
    /// Stable label for the audit trail.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing-token",
            AuthError::InvalidToken => "invalid-token",
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::InsufficientRole => "insufficient-role",
            AuthError::OwnershipDenied(_) => "not-self-and-not-admin",
            AuthError::RoleEscalationDenied => "role-change-requires-admin",
        }
    }
}
