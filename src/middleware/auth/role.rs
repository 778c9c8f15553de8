//! Route-level role gate (`route_layer`), applied after the authentication stage.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};

use crate::authz::{
    AuditEvent, AuditSink, Principal, RoleGate, RoleSet, require_role, target_from_path,
};
use crate::error::AppError;

#[derive(Clone)]
struct GateState {
    action: &'static str,
    gate: RoleGate,
    audit: Arc<dyn AuditSink>,
}

/// Gate `route` so only principals whose role is in `allowed` reach the handler.
///
/// `action` names the route in the audit trail, e.g. `users.delete`.
pub fn require<S>(
    route: MethodRouter<S>,
    action: &'static str,
    allowed: RoleSet,
    audit: Arc<dyn AuditSink>,
) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    let state = GateState {
        action,
        gate: require_role(allowed),
        audit,
    };
    route.route_layer(middleware::from_fn_with_state(state, role_middleware))
}

async fn role_middleware(
    State(gate): State<GateState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let principal = req.extensions().get::<Principal>();

    if let Err(err) = gate.gate.check(principal) {
        let target = target_from_path(req.uri().path());
        gate.audit
            .record(AuditEvent::denied(gate.action, principal, target, err.reason()));
        return Err(err.into());
    }

    Ok(next.run(req).await)
}
