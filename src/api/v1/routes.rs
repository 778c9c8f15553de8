/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - request pipeline の組み立て:
 *   認証 stage (1 回だけ) → [role gate] → handler → [ownership policy] → store
 * - /health は認証の外
 */
use axum::{
    Router,
    routing::{delete, get},
};

use crate::api::v1::handlers::{
    health::health,
    users::{delete_user, get_user, list_users, update_user},
};
use crate::middleware::auth::{access, role};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let roles = state.route_roles;
    let audit = state.audit.clone();

    let list_route = role::require(
        get(list_users),
        "users.list",
        roles.list_users,
        audit.clone(),
    );
    let delete_route = role::require(
        delete(delete_user),
        "users.delete",
        roles.delete_user,
        audit,
    );

    let users = Router::new()
        .route("/users", list_route)
        .route(
            "/users/{user_id}",
            get(get_user).put(update_user).merge(delete_route),
        );

    Router::new()
        .route("/health", get(health))
        .merge(access::apply(users, state))
}
