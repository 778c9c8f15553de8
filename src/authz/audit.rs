//! Audit trail for authorization decisions.
//!
//! Every denial is recorded with the requester (when one was authenticated), the target
//! and the reason, before the error response is produced. Allowed mutations are recorded
//! too so the trail shows who changed what.
//!
//! Records go to the `audit` tracing target; route them with e.g. `RUST_LOG=audit=info`.

use crate::authz::principal::{Principal, UserId};
use crate::authz::role::Role;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    pub id: UserId,
    pub email: String,
    pub role: Role,
}

impl From<&Principal> for Requester {
    fn from(p: &Principal) -> Self {
        Self {
            id: p.id(),
            email: p.email().to_string(),
            role: p.role(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Allowed,
    Denied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// What was attempted, e.g. `users.update`.
    pub action: &'static str,
    pub requester: Option<Requester>,
    pub target: Option<UserId>,
    pub outcome: Outcome,
    pub reason: &'static str,
}

impl AuditEvent {
    pub fn denied(
        action: &'static str,
        principal: Option<&Principal>,
        target: Option<UserId>,
        reason: &'static str,
    ) -> Self {
        Self {
            action,
            requester: principal.map(Requester::from),
            target,
            outcome: Outcome::Denied,
            reason,
        }
    }

    pub fn allowed(action: &'static str, principal: &Principal, target: UserId) -> Self {
        Self {
            action,
            requester: Some(principal.into()),
            target: Some(target),
            outcome: Outcome::Allowed,
            reason: "allowed",
        }
    }
}

/// Target id of `/users/{id}` style paths: the last segment, when it is numeric.
///
/// Stages that deny before the path is extracted use this to keep the target in the trail.
pub fn target_from_path(path: &str) -> Option<UserId> {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|s| s.parse().ok())
}

/// Destination of audit events. Recording is synchronous and must not block.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        let requester_id = event.requester.as_ref().map(|r| r.id);
        let requester_email = event.requester.as_ref().map(|r| r.email.as_str());
        let requester_role = event.requester.as_ref().map(|r| r.role.as_str());

        match event.outcome {
            Outcome::Denied => tracing::warn!(
                target: "audit",
                action = event.action,
                requester_id = ?requester_id,
                requester_email = ?requester_email,
                requester_role = ?requester_role,
                target_id = ?event.target,
                decision = "denied",
                reason = event.reason,
                "access denied"
            ),
            Outcome::Allowed => tracing::info!(
                target: "audit",
                action = event.action,
                requester_id = ?requester_id,
                requester_email = ?requester_email,
                target_id = ?event.target,
                decision = "allowed",
                "access granted"
            ),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_is_last_numeric_segment() {
        assert_eq!(target_from_path("/api/v1/users/99"), Some(99));
        assert_eq!(target_from_path("/users/99/"), Some(99));
        assert_eq!(target_from_path("/api/v1/users"), None);
        assert_eq!(target_from_path("/users/abc"), None);
    }
}
