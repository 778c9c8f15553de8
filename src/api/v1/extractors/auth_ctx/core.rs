use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::authz::{AuditEvent, AuthError, Principal, target_from_path};
use crate::error::AppError;
use crate::state::AppState;

/// Handler で Principal を受け取るための extractor
/// 認証 middleware が request.extensions() に insert 済みである前提
/// 見つからない場合は 401 (middleware 未設定の route)。拒否は audit に残す
pub struct CurrentPrincipal(pub Principal);

impl FromRequestParts<AppState> for CurrentPrincipal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts.extensions.get::<Principal>() {
            return Ok(CurrentPrincipal(principal.clone()));
        }

        // route tree 上は access::apply の内側にしか置かないので通常は到達しない
        let err = AuthError::Unauthenticated;
        let target = target_from_path(parts.uri.path());
        state
            .audit
            .record(AuditEvent::denied("authenticate", None, target, err.reason()));
        Err(err.into())
    }
}
