/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - verifier / users service / audit sink / credential cookie 名 / route ごとの RoleSet
 * - Clone 前提で持つ (内部は Arc/Copy で cheap)。起動後は読み取りのみなので lock 不要
 */
use std::sync::Arc;

use crate::authz::AuditSink;
use crate::config::RouteRoles;
use crate::services::{auth::TokenVerifier, users::UsersService};

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<TokenVerifier>,
    pub users: UsersService,
    pub audit: Arc<dyn AuditSink>,
    pub auth_cookie_name: Arc<str>,
    pub route_roles: RouteRoles,
}

impl AppState {
    pub fn new(
        auth: Arc<TokenVerifier>,
        users: UsersService,
        audit: Arc<dyn AuditSink>,
        auth_cookie_name: &str,
        route_roles: RouteRoles,
    ) -> Self {
        Self {
            auth,
            users,
            audit,
            auth_cookie_name: Arc::from(auth_cookie_name),
            route_roles,
        }
    }
}
