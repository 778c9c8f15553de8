//! 認証 stage: credential (cookie `token`) を検証 → Principal を extensions に入れる
//!
//! - リクエストごとに一度だけ通る (route ごとに重ねて掛けない)
//! - 失敗 (missing / invalid / expired) はすべて同じ 401 を返す。理由は audit にだけ残す
//! - 以降の stage は extensions の Principal だけを信頼する

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::authz::{AuditEvent, target_from_path};
use crate::error::AppError;
use crate::state::AppState;

/// Apply the authentication stage to every route of `router`.
///
/// 例：
/// ```ignore
/// let users = middleware::auth::access::apply(users, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = credential(req.headers(), &state.auth_cookie_name);

    let principal = match state.auth.authenticate(token.as_deref()) {
        Ok(principal) => principal,
        Err(err) => {
            // No principal exists yet: the trail records the target and the reason.
            let target = target_from_path(req.uri().path());
            state
                .audit
                .record(AuditEvent::denied("authenticate", None, target, err.reason()));
            tracing::debug!(
                path = %req.uri().path(),
                reason = err.reason(),
                "authentication failed"
            );
            return Err(err.into());
        }
    };

    tracing::debug!(
        user_id = principal.id(),
        email = principal.email(),
        "user authenticated"
    );

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}

/// The named cookie wins; `Authorization: Bearer` is accepted for non-browser clients.
fn credential(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    parse_cookie(headers, cookie_name).or_else(|| bearer(headers))
}

fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn reads_named_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; token=abc.def.ghi; lang=en"),
        );
        assert_eq!(credential(&headers, "token"), Some("abc.def.ghi".to_string()));
        assert_eq!(credential(&headers, "session"), None);
    }

    #[test]
    fn falls_back_to_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(credential(&headers, "token"), None);

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer mytoken123"),
        );
        assert_eq!(credential(&headers, "token"), Some("mytoken123".to_string()));
    }

    #[test]
    fn empty_cookie_counts_as_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("token="));
        assert_eq!(credential(&headers, "token"), None);
    }
}
